//! # Request Dispatcher
//!
//! Issues exactly one outbound call per submission and hands back the
//! response body as a byte stream. No retries: a failed attempt is reported
//! to the caller immediately.
//!
//! The wire format is deliberately plain:
//!
//! ```text
//! POST <endpoint_url>
//! {"prompt": "...", "modelId": "..."}
//!
//! 200 OK
//! <raw text chunks, no framing>
//! ```

use std::fmt;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::reconciler::StreamError;

/// Response body as a stream of raw byte chunks.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, StreamError>>;

/// Failures before a readable body exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// DNS, connection refused, TLS, timeout.
    Network(String),
    /// The response carries no body to read (e.g. HTTP 204).
    NoBody { status: u16 },
    /// A structured response (the model catalogue) did not parse.
    InvalidBody(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "network error: {msg}"),
            TransportError::NoBody { status } => {
                write!(f, "response has no body (HTTP {status})")
            }
            TransportError::InvalidBody(msg) => write!(f, "malformed response body: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// One outbound call. The model id is fixed for the whole session.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(rename = "modelId")]
    pub model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model_id: model_id.into(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// An entry of the backend's model catalogue.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Sends the request and returns the response body once it is readable.
    async fn send(&self, request: &ChatRequest) -> Result<ByteStream, TransportError>;
}

/// Statuses whose responses never carry a body.
fn is_null_body_status(status: u16) -> bool {
    matches!(status, 101 | 103 | 204 | 205 | 304)
}

/// Dispatcher backed by a `reqwest` client.
pub struct HttpDispatcher {
    endpoint_url: String,
    models_url: String,
    client: reqwest::Client,
}

impl HttpDispatcher {
    pub fn new(endpoint_url: impl Into<String>, models_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            models_url: models_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetches the model catalogue from the backend.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, TransportError> {
        debug!("Fetching model list from {}", self.models_url);
        let response = self
            .client
            .get(&self.models_url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            warn!("Model list request returned HTTP {}", status);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let models: Vec<ModelInfo> = serde_json::from_slice(&body)
            .map_err(|e| TransportError::InvalidBody(e.to_string()))?;
        info!("Backend lists {} models", models.len());
        Ok(models)
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn send(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        info!(
            "Dispatching prompt: model={}, prompt_len={}",
            request.model_id,
            request.prompt.len()
        );

        let response = self
            .client
            .post(&self.endpoint_url)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        debug!("Chat response status: {}", status);

        if is_null_body_status(status.as_u16()) {
            warn!("Chat response has no body (HTTP {})", status.as_u16());
            return Err(TransportError::NoBody {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            // The body is still shown to the user as-is.
            warn!("Chat response is not a success (HTTP {}), streaming body anyway", status.as_u16());
        }

        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| StreamError::Read(e.to_string()))
            })
            .boxed();
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let req = ChatRequest::new("Hi", "model-a");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"prompt": "Hi", "modelId": "model-a"}));
    }

    #[test]
    fn test_request_includes_generation_params_when_set() {
        let req = ChatRequest {
            max_tokens: Some(256),
            temperature: Some(0.5),
            ..ChatRequest::new("Hi", "model-a")
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["max_tokens"], 256);
        assert_eq!(json["temperature"], 0.5);
    }

    #[test]
    fn test_null_body_statuses() {
        for status in [101, 103, 204, 205, 304] {
            assert!(is_null_body_status(status), "{status}");
        }
        for status in [200, 201, 400, 500] {
            assert!(!is_null_body_status(status), "{status}");
        }
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(
            TransportError::NoBody { status: 204 }.to_string(),
            "response has no body (HTTP 204)"
        );
        assert_eq!(
            TransportError::Network("refused".into()).to_string(),
            "network error: refused"
        );
        assert_eq!(
            TransportError::InvalidBody("expected value".into()).to_string(),
            "malformed response body: expected value"
        );
    }
}
