use analog::core::config::{self, AnalogConfig, CliOverrides, ProcessEnv};
use analog::inference::HttpDispatcher;
use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "analog", about = "Terminal chat client for a streaming completion endpoint")]
struct Args {
    /// Chat endpoint URL (overrides config and ANALOG_ENDPOINT_URL)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Model identifier sent with every request
    #[arg(short, long)]
    model: Option<String>,

    /// Print the models offered by the backend and exit
    #[arg(long)]
    list_models: bool,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to analog.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("analog.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("{}, falling back to defaults", e);
        eprintln!("Warning: {e}, using defaults");
        AnalogConfig::default()
    });
    let cli = CliOverrides {
        endpoint_url: args.endpoint,
        model_id: args.model,
    };
    let resolved = config::resolve(&file_config, &cli, &ProcessEnv);

    log::info!(
        "Analog starting up: endpoint={} model={}",
        resolved.endpoint_url,
        resolved.model_id
    );

    if args.list_models {
        let dispatcher = HttpDispatcher::new(resolved.endpoint_url, resolved.models_url);
        return match dispatcher.list_models().await {
            Ok(models) => {
                for model in models {
                    println!("{}\t{}", model.id, model.name);
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("Listing models failed: {}", e);
                eprintln!("Failed to list models: {e}");
                std::process::exit(1);
            }
        };
    }

    analog::tui::run(resolved)
}
