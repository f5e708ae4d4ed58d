/// Microphone capture and streaming
pub mod capture;

/// Audio device enumeration and management
pub mod device;

/// Audio-related error types
pub mod error;

/// Capture pipeline producing fixed-size blocks
pub mod pipeline;

/// Audio resampling
pub mod resampler;

// Re-export commonly used types
pub use capture::{AudioCapture, CaptureStopHandle};
pub use device::{default_output_device, list_input_devices, AudioDevice};
pub use error::{AudioError, AudioResult};
pub use pipeline::{AudioBlock, CapturePipeline, BLOCK_SAMPLES, CAPTURE_SAMPLE_RATE};
pub use resampler::AudioResampler;
