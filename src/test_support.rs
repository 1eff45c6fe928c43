//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::StreamExt;

use crate::core::state::App;
use crate::inference::{ByteStream, ChatRequest, Dispatcher, StreamError, TransportError};

/// Wraps a fixed list of chunk results as a `ByteStream`.
pub fn byte_stream(items: Vec<Result<Vec<u8>, StreamError>>) -> ByteStream {
    futures::stream::iter(items).boxed()
}

/// A dispatcher that replays a script instead of calling the network.
pub struct ScriptedDispatcher {
    outcome: Mutex<Option<Result<Vec<Result<Vec<u8>, StreamError>>, TransportError>>>,
    calls: AtomicUsize,
}

impl ScriptedDispatcher {
    pub fn script(items: Vec<Result<Vec<u8>, StreamError>>) -> Self {
        Self {
            outcome: Mutex::new(Some(Ok(items))),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn chunks(chunks: &[&[u8]]) -> Self {
        Self::script(chunks.iter().map(|c| Ok(c.to_vec())).collect())
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            outcome: Mutex::new(Some(Err(error))),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dispatcher for ScriptedDispatcher {
    async fn send(&self, _request: &ChatRequest) -> Result<ByteStream, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .outcome
            .lock()
            .expect("script lock poisoned")
            .take()
            .unwrap_or_else(|| Ok(Vec::new()));
        outcome.map(byte_stream)
    }
}

/// Creates a test App with a fixed model id.
pub fn test_app() -> App {
    App::new("test-model".to_string())
}
