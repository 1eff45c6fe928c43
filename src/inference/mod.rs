pub mod decoder;
pub mod dispatcher;
pub mod reconciler;

pub use decoder::Utf8Decoder;
pub use dispatcher::{ByteStream, ChatRequest, Dispatcher, HttpDispatcher, ModelInfo, TransportError};
pub use reconciler::{StreamError, StreamEvent, StreamState, TurnError, increments, stream_response};
