//! # Stream Reconciler
//!
//! Turns a response byte stream into an ordered sequence of text increments.
//!
//! ```text
//! ByteStream ──► StreamState (decoder + accumulated text) ──► increments()
//!                                                               │
//!                      stream_response() ◄──────────────────────┘
//!                             │
//!                             ▼
//!               StreamEvent::{Opened, Increment, Ended}
//! ```
//!
//! `increments()` is lazy, finite and cannot be restarted: it ends after
//! end-of-data or after the first error. Feeding it a scripted `ByteStream`
//! makes every suspension point observable in tests.

use std::fmt;

use futures::stream::{self, Stream, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;

use super::decoder::Utf8Decoder;
use super::dispatcher::{ByteStream, ChatRequest, Dispatcher, TransportError};

/// Failures while reading or decoding an established stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The transport failed mid-body.
    Read(String),
    /// An invalid UTF-8 sequence at the given byte offset.
    Decode { offset: usize },
    /// The stream ended inside a multi-byte character.
    TruncatedCharacter { pending: usize },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Read(msg) => write!(f, "stream read error: {msg}"),
            StreamError::Decode { offset } => {
                write!(f, "invalid UTF-8 at byte {offset}")
            }
            StreamError::TruncatedCharacter { pending } => {
                write!(f, "stream ended inside a character ({pending} bytes pending)")
            }
        }
    }
}

impl std::error::Error for StreamError {}

/// Why a request cycle ended without a complete reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    Transport(TransportError),
    Stream(StreamError),
    /// The receiver went away (UI shut down).
    ChannelClosed,
    /// The task running the cycle ended abnormally.
    Aborted(String),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::Transport(e) => write!(f, "{e}"),
            TurnError::Stream(e) => write!(f, "{e}"),
            TurnError::ChannelClosed => write!(f, "channel closed"),
            TurnError::Aborted(msg) => write!(f, "request aborted: {msg}"),
        }
    }
}

impl std::error::Error for TurnError {}

impl From<TransportError> for TurnError {
    fn from(e: TransportError) -> Self {
        TurnError::Transport(e)
    }
}

impl From<StreamError> for TurnError {
    fn from(e: StreamError) -> Self {
        TurnError::Stream(e)
    }
}

/// Progress of one request cycle, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A readable body exists; the placeholder turn can be shown.
    Opened,
    /// Newly decoded text.
    Increment(String),
    /// Clean end-of-data.
    Ended,
}

/// Transient state for one in-flight response.
#[derive(Debug, Default)]
pub struct StreamState {
    decoder: Utf8Decoder,
    accumulated: String,
    done: bool,
    /// An error to report after the increment that preceded it.
    deferred: Option<StreamError>,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text applied so far. Mirrors the open turn's content.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Decodes one chunk. Returns the increment, if any complete text came out.
    ///
    /// When the chunk holds an invalid sequence after some valid text, the
    /// text is returned first and the error is kept for
    /// `take_deferred_error`. The state is done either way.
    pub fn apply_chunk(&mut self, chunk: &[u8]) -> Result<Option<String>, StreamError> {
        if self.done {
            return Ok(None);
        }
        let text = match self.decoder.decode(chunk) {
            Ok(text) => text,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        let increment = self.commit(text);
        if let Some(e) = self.decoder.failure().cloned() {
            self.done = true;
            if increment.is_none() {
                return Err(e);
            }
            self.deferred = Some(e);
        }
        Ok(increment)
    }

    /// The error held back by the last `apply_chunk`, if any.
    pub fn take_deferred_error(&mut self) -> Option<StreamError> {
        self.deferred.take()
    }

    /// Flushes the decoder at end-of-data and marks the state done.
    pub fn finish(&mut self) -> Result<Option<String>, StreamError> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let text = self.decoder.finish()?;
        Ok(self.commit(text))
    }

    fn fail(&mut self) {
        self.done = true;
    }

    fn commit(&mut self, text: String) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        self.accumulated.push_str(&text);
        Some(text)
    }
}

/// Lazily decodes `bytes` into non-empty text increments.
///
/// Yields `Err` at most once, and nothing after it.
pub fn increments(bytes: ByteStream) -> impl Stream<Item = Result<String, StreamError>> {
    stream::unfold((bytes, StreamState::new()), |(mut bytes, mut state)| async move {
        loop {
            if let Some(e) = state.take_deferred_error() {
                return Some((Err(e), (bytes, state)));
            }
            if state.is_done() {
                return None;
            }
            match bytes.next().await {
                Some(Ok(chunk)) => match state.apply_chunk(&chunk) {
                    Ok(Some(text)) => return Some((Ok(text), (bytes, state))),
                    Ok(None) => continue,
                    Err(e) => return Some((Err(e), (bytes, state))),
                },
                Some(Err(e)) => {
                    state.fail();
                    return Some((Err(e), (bytes, state)));
                }
                None => match state.finish() {
                    Ok(Some(text)) => return Some((Ok(text), (bytes, state))),
                    Ok(None) => return None,
                    Err(e) => return Some((Err(e), (bytes, state))),
                },
            }
        }
    })
}

/// Runs one request cycle: dispatch, then forward every increment in order.
///
/// Each increment is delivered before the next chunk is read. Returns the
/// error that ended the cycle, if any; `StreamEvent::Ended` is only sent on
/// a clean end-of-data.
pub async fn stream_response(
    dispatcher: &dyn Dispatcher,
    request: &ChatRequest,
    sender: Sender<StreamEvent>,
) -> Result<(), TurnError> {
    let body = dispatcher.send(request).await?;

    sender
        .send(StreamEvent::Opened)
        .await
        .map_err(|_| TurnError::ChannelClosed)?;

    let mut increments = Box::pin(increments(body));
    let mut count = 0usize;
    let mut total_len = 0usize;

    while let Some(increment) = increments.next().await {
        let text = match increment {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Stream failed after {} increments ({} bytes): {}",
                    count, total_len, e
                );
                return Err(TurnError::Stream(e));
            }
        };
        count += 1;
        total_len += text.len();
        debug!("Increment {} (len={}, total={})", count, text.len(), total_len);
        if sender.send(StreamEvent::Increment(text)).await.is_err() {
            warn!("Increment send failed: receiver dropped");
            return Err(TurnError::ChannelClosed);
        }
    }

    info!("Stream complete: {} increments, {} bytes", count, total_len);
    sender
        .send(StreamEvent::Ended)
        .await
        .map_err(|_| TurnError::ChannelClosed)
}
