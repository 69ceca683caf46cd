//! Error types for the log stream

use thiserror::Error;

use crate::frame::FrameError;

pub type Result<T> = std::result::Result<T, StreamError>;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid stream configuration: {0}")]
    InvalidConfig(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),

    /// The broker answered CONNECT with an ERROR frame
    #[error("broker rejected the connection: {0}")]
    Rejected(String),

    #[error("no CONNECTED frame within {0:?}")]
    HandshakeTimeout(std::time::Duration),

    #[error("connection closed by broker")]
    Closed,
}
