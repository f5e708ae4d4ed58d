/// Network communication and WebSocket handling
///
/// This module provides types and utilities for communicating with the
/// live bidirectional voice endpoint via WebSocket.

/// WebSocket connection management
pub mod connection;

/// Network error types
pub mod error;

/// WebSocket message type definitions
pub mod messages;

/// Async tasks for concurrent send/receive operations
pub mod tasks;

// Re-export commonly used types
pub use connection::{
    LiveConfig, LiveConnection, WsReader, WsWriter, DEFAULT_LIVE_INSTRUCTION, DEFAULT_LIVE_MODEL,
    DEFAULT_VOICE,
};
pub use error::{NetworkError, NetworkResult};
pub use messages::{
    InlineData, MediaChunk, RealtimeInputMessage, ServerContent, ServerMessage, SetupMessage,
    INPUT_AUDIO_MIME,
};
pub use tasks::{receiver_task, sender_task, ServerEvent};
