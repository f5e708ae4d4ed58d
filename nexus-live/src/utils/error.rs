//! Global error handling
//!
//! Provides a unified application error type aggregating every module's
//! errors, plus user-facing messages and error codes for the embedding
//! client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::error::AudioError;
use crate::codec::CodecError;
use crate::live::SessionError;
use crate::network::error::NetworkError;
use crate::state::StateError;

/// Application error type
///
/// Aggregates errors from every module behind a single surface.
#[derive(Error, Debug)]
pub enum AppError {
    /// Audio error
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Codec error
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Session error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// State machine error
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for the embedding client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Microphone or speaker device not found
    AudioDeviceNotFound,
    /// Microphone access denied
    AudioPermissionDenied,
    /// Audio stream error
    AudioStreamError,
    /// Resampling failed
    AudioResampleFailed,

    /// Connection failed
    NetworkConnectionFailed,
    /// Authentication failed (invalid API key)
    NetworkAuthFailed,
    /// Connection timeout
    NetworkTimeout,

    /// Malformed audio payload
    CodecMalformedAudio,

    /// Session already running
    SessionAlreadyRunning,

    /// Internal error
    InternalError,
}

impl AppError {
    /// Error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Audio(AudioError::DeviceUnavailable(_)) => ErrorCode::AudioDeviceNotFound,
            AppError::Audio(AudioError::PermissionDenied(_)) => ErrorCode::AudioPermissionDenied,
            AppError::Audio(AudioError::ResampleFailed(_)) => ErrorCode::AudioResampleFailed,
            AppError::Audio(_) => ErrorCode::AudioStreamError,

            AppError::Network(NetworkError::AuthenticationFailed) => ErrorCode::NetworkAuthFailed,
            AppError::Network(NetworkError::Timeout(_)) => ErrorCode::NetworkTimeout,
            AppError::Network(_) => ErrorCode::NetworkConnectionFailed,

            AppError::Codec(_) => ErrorCode::CodecMalformedAudio,

            AppError::Session(SessionError::AlreadyRunning) => ErrorCode::SessionAlreadyRunning,
            AppError::Session(SessionError::Audio(e)) => {
                AppError::Audio(clone_audio_kind(e)).code()
            }
            AppError::Session(SessionError::Network(_)) => ErrorCode::NetworkConnectionFailed,

            AppError::State(_) => ErrorCode::InternalError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Message suitable to show a user directly
    pub fn user_message(&self) -> String {
        match self.code() {
            ErrorCode::AudioDeviceNotFound => {
                "No microphone found. Check your audio settings.".to_string()
            }
            ErrorCode::AudioPermissionDenied => {
                "Microphone access was denied. Allow it in system settings.".to_string()
            }
            ErrorCode::AudioStreamError => "Audio failed. Please try again.".to_string(),
            ErrorCode::AudioResampleFailed => {
                "Audio processing failed. Please try again.".to_string()
            }
            ErrorCode::NetworkConnectionFailed => {
                "Could not reach the server. Check your connection.".to_string()
            }
            ErrorCode::NetworkAuthFailed => {
                "Invalid API key. Update it in settings.".to_string()
            }
            ErrorCode::NetworkTimeout => "The connection timed out. Try again.".to_string(),
            ErrorCode::CodecMalformedAudio => {
                "Received unplayable audio. Please try again.".to_string()
            }
            ErrorCode::SessionAlreadyRunning => "A voice session is already active.".to_string(),
            ErrorCode::InternalError => format!("Internal error: {}", self),
        }
    }

    /// Whether retrying the operation can reasonably succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Internal(_) | AppError::State(_))
    }

    /// Whether this is an authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self.code(), ErrorCode::NetworkAuthFailed)
    }
}

// AudioError is not Clone; code() only needs the variant shape.
fn clone_audio_kind(e: &AudioError) -> AudioError {
    match e {
        AudioError::DeviceUnavailable(s) => AudioError::DeviceUnavailable(s.clone()),
        AudioError::PermissionDenied(s) => AudioError::PermissionDenied(s.clone()),
        AudioError::ResampleFailed(s) => AudioError::ResampleFailed(s.clone()),
        other => AudioError::StreamError(other.to_string()),
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::Audio(AudioError::DeviceUnavailable("none".to_string()));
        assert_eq!(err.code(), ErrorCode::AudioDeviceNotFound);

        let err = AppError::Network(NetworkError::AuthenticationFailed);
        assert_eq!(err.code(), ErrorCode::NetworkAuthFailed);

        let err = AppError::Session(SessionError::AlreadyRunning);
        assert_eq!(err.code(), ErrorCode::SessionAlreadyRunning);
    }

    #[test]
    fn test_session_error_unwraps_audio_cause() {
        let err = AppError::Session(SessionError::Audio(AudioError::PermissionDenied(
            "mic".to_string(),
        )));
        assert_eq!(err.code(), ErrorCode::AudioPermissionDenied);
    }

    #[test]
    fn test_user_message() {
        let err = AppError::Network(NetworkError::AuthenticationFailed);
        assert!(err.user_message().contains("API key"));

        let err = AppError::Audio(AudioError::PermissionDenied("denied".to_string()));
        assert!(err.user_message().contains("Microphone"));
    }

    #[test]
    fn test_recoverable() {
        let err = AppError::Network(NetworkError::ConnectionFailed("test".to_string()));
        assert!(err.is_recoverable());

        let err = AppError::Internal("fatal".to_string());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_from_string() {
        let err: AppError = "test error".into();
        match err {
            AppError::Internal(msg) => assert_eq!(msg, "test error"),
            _ => panic!("Expected Internal error"),
        }
    }

    #[test]
    fn test_error_code_serialization() {
        let code = ErrorCode::AudioDeviceNotFound;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"AUDIO_DEVICE_NOT_FOUND\"");

        let deserialized: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, code);
    }
}
