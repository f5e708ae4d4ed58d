/// Gapless playback scheduling
pub mod scheduler;

/// Output sink abstraction and cpal implementation
pub mod sink;

// Re-export commonly used types
pub use scheduler::{PlaybackScheduler, PlaybackUnit};
pub use sink::{AudioSink, CpalSink, PLAYBACK_SAMPLE_RATE};
