//! # Transcript Store
//!
//! The conversation as an ordered, append-only list of turns.
//!
//! ```text
//! TranscriptStore
//! ├── current: Transcript          // latest published snapshot
//! │   └── turns: Vec<Arc<Turn>>    // shared between snapshots
//! └── open: bool                   // last turn still receiving text
//! ```
//!
//! Every mutation publishes a new `Transcript`. Turns that did not change are
//! shared with the previous snapshot through their `Arc`, so an observer can
//! compare snapshots cheaply and re-render only what moved. Only the last
//! turn is ever replaced, and only while it is open.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Fixed text of the assistant turn appended when a request cycle fails.
pub const ERROR_TURN_TEXT: &str = "Error: Failed to get response.";

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Why a submission was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Input was empty or whitespace only.
    Blank,
    /// A request is already in flight.
    Busy,
}

impl fmt::Display for SubmitRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitRejection::Blank => write!(f, "message is empty"),
            SubmitRejection::Busy => write!(f, "a response is still streaming"),
        }
    }
}

impl std::error::Error for SubmitRejection {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptError {
    /// There is no assistant turn open for writing.
    NoOpenTurn,
}

impl fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptError::NoOpenTurn => write!(f, "no open assistant turn"),
        }
    }
}

impl std::error::Error for TranscriptError {}

/// An immutable view of the conversation at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    turns: Vec<Arc<Turn>>,
    open: bool,
}

impl Transcript {
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Arc<Turn>] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last().map(Arc::as_ref)
    }

    /// True while the last turn is an assistant turn still receiving text.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// True when the open turn has not received any text yet.
    pub fn is_awaiting_first_increment(&self) -> bool {
        self.open && self.last().is_some_and(|t| t.content.is_empty())
    }

    fn with_pushed(&self, turn: Turn, open: bool) -> Transcript {
        let mut turns = self.turns.clone();
        turns.push(Arc::new(turn));
        Transcript { turns, open }
    }
}

/// Owner of the current snapshot and the only place it changes.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    current: Transcript,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot. Cloning only copies the `Arc` handles.
    pub fn snapshot(&self) -> Transcript {
        self.current.clone()
    }

    pub fn current(&self) -> &Transcript {
        &self.current
    }

    /// Appends a user turn holding `text` as typed. Blank text is rejected.
    pub fn append_user_turn(&mut self, text: &str) -> Result<(), SubmitRejection> {
        if text.trim().is_empty() {
            return Err(SubmitRejection::Blank);
        }
        self.close_open_turn();
        self.current = self.current.with_pushed(Turn::user(text), false);
        Ok(())
    }

    /// Appends the empty assistant placeholder and opens it for increments.
    pub fn append_empty_assistant_turn(&mut self) {
        self.current = self.current.with_pushed(Turn::assistant(""), true);
    }

    /// Appends `delta` to the open turn, publishing a new snapshot.
    pub fn extend_last_turn(&mut self, delta: &str) -> Result<(), TranscriptError> {
        if !self.current.open {
            return Err(TranscriptError::NoOpenTurn);
        }
        let Some(last) = self.current.turns.last() else {
            return Err(TranscriptError::NoOpenTurn);
        };
        if delta.is_empty() {
            return Ok(());
        }

        let mut extended = Turn::clone(last);
        extended.content.push_str(delta);

        let mut turns = self.current.turns.clone();
        let idx = turns.len() - 1;
        turns[idx] = Arc::new(extended);
        self.current = Transcript { turns, open: true };
        Ok(())
    }

    /// Closes the open turn. No further text can be appended to it.
    pub fn close_open_turn(&mut self) {
        if self.current.open {
            self.current = Transcript {
                turns: self.current.turns.clone(),
                open: false,
            };
        }
    }

    /// Closes any open turn, keeping its partial text, and appends the error turn.
    pub fn append_error_turn(&mut self) {
        self.close_open_turn();
        self.current = self
            .current
            .with_pushed(Turn::assistant(ERROR_TURN_TEXT), false);
    }
}
