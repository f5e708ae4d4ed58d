use thiserror::Error;

/// Audio-related errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// No usable audio device exists
    #[error("No audio device available: {0}")]
    DeviceUnavailable(String),

    /// The OS refused access to the device
    #[error("Audio device access denied: {0}")]
    PermissionDenied(String),

    /// Failed to build audio stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildFailed(String),

    /// Audio stream error
    #[error("Audio stream error: {0}")]
    StreamError(String),

    /// Resampling failed
    #[error("Resampling failed: {0}")]
    ResampleFailed(String),

    /// Device name is invalid
    #[error("Device name is invalid UTF-8")]
    InvalidDeviceName,

    /// cpal error
    #[error("cpal error: {0}")]
    CpalError(#[from] cpal::DevicesError),

    /// Default config error
    #[error("Default config error: {0}")]
    DefaultConfigError(#[from] cpal::DefaultStreamConfigError),

    /// Supported config error
    #[error("Supported config error: {0}")]
    SupportedConfigError(#[from] cpal::SupportedStreamConfigsError),
}

impl AudioError {
    /// Classify a cpal stream build failure.
    ///
    /// cpal reports OS-level denial and unplugged devices through the
    /// same error type; the session surface needs them apart.
    pub fn from_build_error(err: cpal::BuildStreamError) -> Self {
        match err {
            cpal::BuildStreamError::DeviceNotAvailable => {
                AudioError::DeviceUnavailable("device disappeared during stream build".to_string())
            }
            cpal::BuildStreamError::BackendSpecific { err }
                if err.description.to_lowercase().contains("denied")
                    || err.description.to_lowercase().contains("permission") =>
            {
                AudioError::PermissionDenied(err.description)
            }
            other => AudioError::StreamBuildFailed(other.to_string()),
        }
    }
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
