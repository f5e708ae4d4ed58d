//! Real-time voice session client
//!
//! Streams microphone audio to a bidirectional generative voice
//! endpoint and plays model responses back gaplessly, with immediate
//! interruption when the server abandons a turn. A REST client covers
//! the companion text-chat and image-generation calls.
//!
//! # Quick start
//!
//! ```no_run
//! use nexus_live::live::{LiveSession, SessionEvent};
//! use nexus_live::network::LiveConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     nexus_live::utils::logging::init_logging();
//!
//!     let mut session = LiveSession::new(LiveConfig::new());
//!     session
//!         .connect("your-api-key", |event| {
//!             if event == SessionEvent::Closed {
//!                 println!("session over");
//!             }
//!         })
//!         .await
//!         .unwrap();
//! }
//! ```

/// Microphone capture, devices and resampling
pub mod audio;

/// PCM16 encode/decode
pub mod codec;

/// REST client for text and image generation
pub mod genai;

/// End-to-end voice session management
pub mod live;

/// WebSocket communication with the live endpoint
pub mod network;

/// Gapless, interruptible playback
pub mod playback;

/// Session lifecycle state machine
pub mod state;

/// Logging and global error handling
pub mod utils;
