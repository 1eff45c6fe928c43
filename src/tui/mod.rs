//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Data flow
//!
//! The event loop owns `App` and is its only mutator. A request cycle runs
//! on a tokio task and reports back through a channel:
//!
//! ```text
//! InputBox ──Submit──► update() ──SpawnRequest──► tokio task
//!                          ▲                        │ stream_response()
//!                          └──── Action ◄── mpsc ◄──┘ StreamEvent / TurnError
//! ```
//!
//! Actions are drained between frames in arrival order, so the transcript
//! never sees two mutations interleave.
//!
//! ## Redraw Strategy
//!
//! - **Loading**: draws every ~80ms for the pulse animation.
//! - **Idle**: sleeps up to 500ms, only redraws on events.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};

use crossterm::cursor::{SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::state::App;
use crate::inference::{
    ChatRequest, Dispatcher, HttpDispatcher, StreamEvent, TurnError, stream_response,
};
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Capacity of the per-request stream event channel.
const STREAM_CHANNEL_CAPACITY: usize = 100;

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub pulse_value: f32,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            pulse_value: 0.0,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock, // Non-blinking: avoids blink timer reset from continuous redraws
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste);
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let dispatcher: Arc<dyn Dispatcher> = Arc::new(HttpDispatcher::new(
        config.endpoint_url.clone(),
        config.models_url.clone(),
    ));
    let mut app = App::from_config(&config);
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    let start_time = std::time::Instant::now();
    let mut needs_redraw = true; // Force first frame

    loop {
        let animating = app.is_loading;
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let elapsed = start_time.elapsed().as_secs_f32();
            tui.pulse_value = (elapsed * 5.0).sin() * 0.5 + 0.5;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            std::time::Duration::from_millis(80)
        } else {
            std::time::Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain ALL pending events before next draw
        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            match event {
                TuiEvent::Resize => {}
                TuiEvent::ForceQuit | TuiEvent::Quit => {
                    if update(&mut app, Action::Quit) == Effect::Quit {
                        should_quit = true;
                    }
                }
                TuiEvent::ScrollUp
                | TuiEvent::ScrollDown
                | TuiEvent::ScrollPageUp
                | TuiEvent::ScrollPageDown
                | TuiEvent::ScrollToBottom => {
                    tui.message_list.handle_event(&event);
                }
                _ => {
                    if let Some(InputEvent::Submit(text)) = tui.input_box.handle_event(&event)
                        && let Effect::SpawnRequest(request) =
                            update(&mut app, Action::Submit(text))
                    {
                        tui.message_list.stick_to_bottom = true;
                        spawn_request(dispatcher.clone(), request, tx.clone());
                    }
                }
            }
        }

        if should_quit {
            break;
        }

        // Handle background task actions (streaming responses)
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            update(&mut app, action);
        }
    }

    ratatui::restore();
    Ok(())
}

/// Runs one request cycle on a tokio task and forwards its progress as actions.
///
/// The failure, if any, is forwarded only after every event that preceded it,
/// so partial text always lands before the error turn.
fn spawn_request(dispatcher: Arc<dyn Dispatcher>, request: ChatRequest, tx: mpsc::Sender<Action>) {
    info!("Spawning request");

    let (event_tx, mut event_rx) = tokio::sync::mpsc::channel::<StreamEvent>(STREAM_CHANNEL_CAPACITY);

    let stream_task = tokio::spawn(async move {
        stream_response(dispatcher.as_ref(), &request, event_tx).await
    });

    tokio::spawn(async move {
        let mut forwarded = 0usize;
        while let Some(event) = event_rx.recv().await {
            forwarded += 1;
            if tx.send(Action::from(event)).is_err() {
                warn!("Failed to forward stream event: receiver dropped");
                return;
            }
        }
        debug!("Stream event channel closed after {} events", forwarded);

        let outcome = stream_task
            .await
            .unwrap_or_else(|e| Err(TurnError::Aborted(e.to_string())));
        if let Err(e) = outcome {
            info!("Request cycle failed: {}", e);
            if tx.send(Action::RequestFailed(e)).is_err() {
                warn!("Failed to send failure action: receiver dropped");
            }
        }
    });
}
