/// Network error types for the live endpoint and REST collaborators

use thiserror::Error;

/// Network-related errors
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Failed to connect to the endpoint
    #[error("Failed to connect: {0}")]
    ConnectionFailed(String),

    /// Authentication failed (invalid API key)
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// Connection timeout
    #[error("Connection timeout after {0}ms")]
    Timeout(u64),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    /// Failed to serialize or deserialize a message
    #[error("Failed to (de)serialize message: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP request failure
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Connection closed unexpectedly
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The endpoint returned an error
    #[error("Server error: {0}")]
    ServerError(String),
}

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

impl From<tokio_tungstenite::tungstenite::http::Error> for NetworkError {
    fn from(err: tokio_tungstenite::tungstenite::http::Error) -> Self {
        NetworkError::HttpError(err.to_string())
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        NetworkError::HttpError(err.to_string())
    }
}
