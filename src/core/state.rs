//! # Application State
//!
//! Core business state for Analog. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── transcript: TranscriptStore   // conversation turns
//! ├── model_id: String              // fixed for the session
//! ├── max_tokens: Option<u32>       // generation parameters
//! ├── temperature: Option<f32>
//! ├── is_loading: bool              // a request is in flight
//! ├── phase: RequestPhase           // per-request state machine
//! ├── status_message: String        // status bar text
//! └── last_error: Option<String>    // most recent failure, for display
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use log::debug;

use crate::core::config::ResolvedConfig;
use crate::core::transcript::TranscriptStore;
use crate::inference::ChatRequest;

/// Where the current request cycle is.
///
/// ```text
/// Idle → Dispatching → Streaming → Idle
///             │            │
///             └──► Error ◄─┘ → Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Dispatching,
    Streaming,
    Error,
}

pub struct App {
    pub transcript: TranscriptStore,
    pub model_id: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub is_loading: bool,
    pub phase: RequestPhase,
    pub status_message: String,
    pub last_error: Option<String>,
}

impl App {
    pub fn new(model_id: String) -> Self {
        Self {
            transcript: TranscriptStore::new(),
            model_id,
            max_tokens: None,
            temperature: None,
            is_loading: false,
            phase: RequestPhase::Idle,
            status_message: String::from("Ready"),
            last_error: None,
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            ..Self::new(config.model_id.clone())
        }
    }

    /// Builds the outbound request for `prompt` with the session's model settings.
    pub fn request_for(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            ..ChatRequest::new(prompt, self.model_id.clone())
        }
    }

    pub(crate) fn transition(&mut self, to: RequestPhase) {
        debug!("Request phase: {:?} -> {:?}", self.phase, to);
        self.phase = to;
    }
}
