//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.analog/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AnalogConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub endpoint_url: Option<String>,
    pub models_url: Option<String>,
    pub model_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GenerationConfig {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:8000/chat";
pub const DEFAULT_MODELS_URL: &str = "http://localhost:8000/models";
pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-5-20250929-v1:0";

// ============================================================================
// Resolved Config (concrete values)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub endpoint_url: String,
    pub models_url: String,
    pub model_id: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Values given on the command line (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub endpoint_url: Option<String>,
    pub model_id: Option<String>,
}

/// Environment lookups, injectable so resolution is testable.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.analog/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".analog").join("config.toml"))
}

/// Load config from `~/.analog/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `AnalogConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<AnalogConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(AnalogConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(AnalogConfig::default());
    }

    load_config_from(&path)
}

/// Parses the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<AnalogConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: AnalogConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# Analog Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [backend]
# endpoint_url = "http://localhost:8000/chat"     # Or ANALOG_ENDPOINT_URL
# models_url = "http://localhost:8000/models"     # Or ANALOG_MODELS_URL
# model_id = "us.anthropic.claude-sonnet-4-5-20250929-v1:0"   # Or ANALOG_MODEL_ID

# [generation]
# max_tokens = 1000
# temperature = 0.7
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &AnalogConfig, cli: &CliOverrides, env: &dyn EnvSource) -> ResolvedConfig {
    // Endpoint: CLI → env → config → default
    let endpoint_url = cli
        .endpoint_url
        .clone()
        .or_else(|| env.var("ANALOG_ENDPOINT_URL"))
        .or_else(|| config.backend.endpoint_url.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT_URL.to_string());

    // Models URL: env → config → default
    let models_url = env
        .var("ANALOG_MODELS_URL")
        .or_else(|| config.backend.models_url.clone())
        .unwrap_or_else(|| DEFAULT_MODELS_URL.to_string());

    // Model: CLI → env → config → default
    let model_id = cli
        .model_id
        .clone()
        .or_else(|| env.var("ANALOG_MODEL_ID"))
        .or_else(|| config.backend.model_id.clone())
        .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());

    ResolvedConfig {
        endpoint_url,
        models_url,
        model_id,
        max_tokens: config.generation.max_tokens,
        temperature: config.generation.temperature,
    }
}
