//! # Actions
//!
//! Everything that can happen in Analog becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! Bytes arrive? That's `Action::ResponseChunk(text)`.
//!
//! The `update()` function takes the current state and an action,
//! applies it, and returns an `Effect` describing any I/O the caller must
//! perform. No side effects here. I/O happens elsewhere.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! Every failure of a request cycle ends here as `Action::RequestFailed`,
//! so the loading flag is cleared on every exit path.

use log::{debug, info, warn};

use crate::core::state::{App, RequestPhase};
use crate::core::transcript::SubmitRejection;
use crate::inference::{ChatRequest, StreamEvent, TurnError};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The user submitted the input box.
    Submit(String),
    /// The response body is readable.
    StreamOpened,
    /// A decoded text increment.
    ResponseChunk(String),
    /// The stream reached end-of-data.
    ResponseDone,
    /// Dispatch or streaming failed.
    RequestFailed(TurnError),
    Quit,
}

impl From<StreamEvent> for Action {
    fn from(event: StreamEvent) -> Self {
        match event {
            StreamEvent::Opened => Action::StreamOpened,
            StreamEvent::Increment(text) => Action::ResponseChunk(text),
            StreamEvent::Ended => Action::ResponseDone,
        }
    }
}

/// I/O the caller must perform after `update()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    SpawnRequest(ChatRequest),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => submit(app, text),
        Action::StreamOpened => {
            if app.phase != RequestPhase::Dispatching {
                warn!("Stream opened in phase {:?}, ignoring", app.phase);
                return Effect::None;
            }
            app.transcript.append_empty_assistant_turn();
            app.transition(RequestPhase::Streaming);
            app.status_message = String::from("Streaming...");
            Effect::None
        }
        Action::ResponseChunk(text) => {
            if let Err(e) = app.transcript.extend_last_turn(&text) {
                warn!("Dropping chunk (len={}): {}", text.len(), e);
            }
            Effect::None
        }
        Action::ResponseDone => {
            if app.phase != RequestPhase::Streaming {
                warn!("Stream ended in phase {:?}, ignoring", app.phase);
                return Effect::None;
            }
            app.transcript.close_open_turn();
            app.is_loading = false;
            app.transition(RequestPhase::Idle);
            app.status_message = String::from("Ready");
            info!(
                "Turn complete, transcript has {} turns",
                app.transcript.current().len()
            );
            Effect::None
        }
        Action::RequestFailed(error) => {
            if !app.is_loading {
                warn!("Failure reported while idle, ignoring: {}", error);
                return Effect::None;
            }
            warn!("Request failed in phase {:?}: {}", app.phase, error);
            app.transition(RequestPhase::Error);
            app.transcript.append_error_turn();
            app.is_loading = false;
            app.last_error = Some(error.to_string());
            app.status_message = String::from("Request failed");
            app.transition(RequestPhase::Idle);
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

fn submit(app: &mut App, text: String) -> Effect {
    if app.is_loading {
        debug!("Submission ignored: {}", SubmitRejection::Busy);
        return Effect::None;
    }
    if let Err(rejection) = app.transcript.append_user_turn(&text) {
        debug!("Submission rejected: {}", rejection);
        app.status_message = format!("Not sent: {}", rejection);
        return Effect::None;
    }

    app.is_loading = true;
    app.last_error = None;
    app.transition(RequestPhase::Dispatching);
    app.status_message = String::from("Thinking...");
    Effect::SpawnRequest(app.request_for(&text))
}
