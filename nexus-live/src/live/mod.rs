/// End-to-end voice session management
///
/// This module ties the capture pipeline, the live WebSocket connection
/// and the playback scheduler into a single bidirectional voice session:
/// microphone blocks stream up, model audio streams down and plays
/// gaplessly, and server interruptions cut playback immediately.

use crate::audio::{AudioError, CapturePipeline};
use crate::codec;
use crate::network::tasks::{receiver_task, sender_task, ServerEvent};
use crate::network::{LiveConfig, LiveConnection, NetworkError};
use crate::playback::{CpalSink, PlaybackScheduler, PLAYBACK_SAMPLE_RATE};
use crate::state::{SessionState, StateCell};
use arc_swap::ArcSwap;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Events emitted over the lifetime of a voice session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The connection is open and streaming in both directions
    Connected,

    /// The server abandoned its in-flight response; playback was cut
    Interrupted,

    /// The model finished its turn
    TurnComplete,

    /// The session ended
    Closed,

    /// The session failed
    Error { message: String },
}

/// Errors surfaced by session control operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Audio-related error
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Network-related error
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// A session is already connecting or connected
    #[error("Session is already running")]
    AlreadyRunning,
}

/// Bidirectional voice session
///
/// Owns the microphone pipeline and the tasks that drive the live
/// connection. Connection is atomic: either every resource (microphone,
/// socket, speaker) comes up and the session is open, or everything
/// acquired so far is released and the session is failed.
///
/// # Example
/// ```no_run
/// use nexus_live::live::{LiveSession, SessionEvent};
/// use nexus_live::network::LiveConfig;
///
/// #[tokio::main]
/// async fn main() {
///     let mut session = LiveSession::new(LiveConfig::new());
///
///     session
///         .connect("your-api-key", |event| match event {
///             SessionEvent::Connected => println!("listening..."),
///             SessionEvent::Closed => println!("session over"),
///             _ => {}
///         })
///         .await
///         .unwrap();
///
///     tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
///     session.disconnect().await.unwrap();
/// }
/// ```
pub struct LiveSession {
    config: LiveConfig,

    /// Lifecycle state, lock-free readable
    state: Arc<StateCell>,

    /// Peak magnitude of recently scheduled audio, 0.0..=1.0
    activity: Arc<ArcSwap<f32>>,

    /// Microphone pipeline (present while connected)
    pipeline: Option<CapturePipeline>,

    /// Block-encoder task handle
    encoder_handle: Option<JoinHandle<()>>,

    /// Sender task handle
    sender_handle: Option<JoinHandle<Result<(), NetworkError>>>,

    /// Receiver task handle
    receiver_handle: Option<JoinHandle<Result<(), NetworkError>>>,

    /// Event timeline task handle
    event_handle: Option<JoinHandle<()>>,
}

impl LiveSession {
    /// Create an idle session with the given configuration
    pub fn new(config: LiveConfig) -> Self {
        Self {
            config,
            state: Arc::new(StateCell::new()),
            activity: Arc::new(ArcSwap::from_pointee(0.0f32)),
            pipeline: None,
            encoder_handle: None,
            sender_handle: None,
            receiver_handle: None,
            event_handle: None,
        }
    }

    /// Connect and start streaming
    ///
    /// Acquires the microphone, opens the live connection (including the
    /// setup handshake), opens the speaker, then spawns the streaming
    /// tasks. On any failure every resource acquired so far is released
    /// and the session moves to the failed state.
    ///
    /// `on_event` is invoked from the session's event timeline: events
    /// arrive in the order the server produced them.
    ///
    /// # Errors
    /// `SessionError::AlreadyRunning` when the session is connecting or
    /// open; audio and network errors pass through.
    pub async fn connect<F>(&mut self, api_key: &str, on_event: F) -> Result<(), SessionError>
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        if self.state.transition(SessionState::Connecting).is_err() {
            return Err(SessionError::AlreadyRunning);
        }

        info!("Starting voice session");

        match self.connect_inner(api_key, on_event).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Atomic failure: nothing stays half-acquired.
                if let Some(mut pipeline) = self.pipeline.take() {
                    pipeline.stop().await;
                }
                let _ = self.state.transition(SessionState::Failed);
                error!("Voice session failed to start: {}", e);
                Err(e)
            }
        }
    }

    async fn connect_inner<F>(&mut self, api_key: &str, on_event: F) -> Result<(), SessionError>
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        // 1. Acquire the microphone
        let mut pipeline = CapturePipeline::new(None)?;
        let stop_handle = pipeline.capture_stop_handle();

        // 2. Open the live connection and complete the handshake
        let connection = LiveConnection::connect(api_key, &self.config).await?;

        // 3. Open the speaker
        let sink = CpalSink::new()?;
        let scheduler = PlaybackScheduler::new(sink);

        // 4. Wire up channels and start the pipeline
        let (block_tx, mut block_rx) = mpsc::channel(100);
        let (frame_tx, frame_rx) = mpsc::channel::<String>(100);
        let (event_tx, mut event_rx) = mpsc::channel::<ServerEvent>(100);

        pipeline.start(block_tx).await?;
        self.pipeline = Some(pipeline);

        let (writer, reader) = connection.split();

        // 5. Encoder task: capture blocks -> PCM16 -> base64 frames
        let encoder_handle = tokio::spawn(async move {
            while let Some(block) = block_rx.recv().await {
                let frame = BASE64.encode(codec::encode(&block));
                if frame_tx.send(frame).await.is_err() {
                    debug!("Frame channel closed, encoder stopping");
                    break;
                }
            }
            debug!("Encoder task finished");
        });

        // 6. Sender and receiver tasks
        let sender_handle = tokio::spawn(sender_task(writer, frame_rx));
        let receiver_handle = tokio::spawn(receiver_task(reader, event_tx));

        // 7. Event timeline: the single ordered consumer of server
        //    events, owner of the playback scheduler.
        let on_event = Arc::new(on_event);
        let on_event_task = Arc::clone(&on_event);
        let state = Arc::clone(&self.state);
        let activity = Arc::clone(&self.activity);
        let event_handle = tokio::spawn(async move {
            let mut scheduler = scheduler;

            while let Some(event) = event_rx.recv().await {
                match event {
                    ServerEvent::AudioChunk(bytes) => {
                        let chunk = match codec::decode(&bytes, PLAYBACK_SAMPLE_RATE, 1) {
                            Ok(chunk) => chunk,
                            Err(e) => {
                                warn!("Dropping malformed audio chunk: {}", e);
                                continue;
                            }
                        };

                        activity.store(Arc::new(peak_activity(&chunk.samples)));

                        if let Err(e) = scheduler.schedule(&chunk) {
                            warn!("Failed to schedule audio chunk: {}", e);
                        }
                    }
                    ServerEvent::Interrupted => {
                        scheduler.interrupt();
                        activity.store(Arc::new(0.0));
                        on_event_task(SessionEvent::Interrupted);
                    }
                    ServerEvent::TurnComplete => {
                        on_event_task(SessionEvent::TurnComplete);
                    }
                    ServerEvent::Closed => {
                        // Release the speaker and microphone before
                        // reporting the closure upward.
                        scheduler.shutdown();
                        stop_handle.stop();
                        activity.store(Arc::new(0.0));
                        state.force_closed();
                        info!("Session closed by server");
                        on_event_task(SessionEvent::Closed);
                        break;
                    }
                    ServerEvent::Error(message) => {
                        scheduler.shutdown();
                        stop_handle.stop();
                        activity.store(Arc::new(0.0));
                        state.force_closed();
                        warn!("Session ended with error: {}", message);
                        on_event_task(SessionEvent::Error { message });
                        break;
                    }
                }
            }

            scheduler.shutdown();
            debug!("Event timeline finished");
        });

        self.encoder_handle = Some(encoder_handle);
        self.sender_handle = Some(sender_handle);
        self.receiver_handle = Some(receiver_handle);
        self.event_handle = Some(event_handle);

        // The event timeline may already have closed the session if the
        // server dropped us immediately; that state wins.
        if self.state.transition(SessionState::Open).is_ok() {
            info!("Voice session open");
            on_event(SessionEvent::Connected);
        }

        Ok(())
    }

    /// Disconnect and release every resource
    ///
    /// Stops capture, drains the task chain, and closes the session.
    /// Safe to call repeatedly and before any connect.
    pub async fn disconnect(&mut self) -> Result<(), SessionError> {
        if self.pipeline.is_none() && self.event_handle.is_none() {
            debug!("Disconnect with no running session");
            let _ = self.state.transition(SessionState::Closed);
            return Ok(());
        }

        info!("Stopping voice session");

        // 1. Stop capture; this closes the block channel, which winds
        //    down the encoder, then the sender (which closes the socket).
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.stop().await;
        }

        // 2. Drain the task chain
        if let Some(handle) = self.encoder_handle.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.sender_handle.take() {
            match handle.await {
                Ok(Ok(())) => debug!("Sender task completed"),
                Ok(Err(e)) => warn!("Sender task ended with error: {}", e),
                Err(e) => error!("Sender task panicked: {}", e),
            }
        }

        // The receiver and the timeline are unblocked by the socket
        // closing; bound the wait in case the peer never answers.
        let drain = tokio::time::Duration::from_secs(5);
        if let Some(handle) = self.receiver_handle.take() {
            match tokio::time::timeout(drain, handle).await {
                Ok(Ok(Ok(()))) => debug!("Receiver task completed"),
                Ok(Ok(Err(e))) => warn!("Receiver task ended with error: {}", e),
                Ok(Err(e)) => error!("Receiver task panicked: {}", e),
                Err(_) => warn!("Receiver task did not finish in time"),
            }
        }
        if let Some(handle) = self.event_handle.take() {
            match tokio::time::timeout(drain, handle).await {
                Ok(Ok(())) => debug!("Event timeline completed"),
                Ok(Err(e)) => error!("Event timeline panicked: {}", e),
                Err(_) => warn!("Event timeline did not finish in time"),
            }
        }

        self.activity.store(Arc::new(0.0));
        let _ = self.state.transition(SessionState::Closed);
        info!("Voice session stopped");

        Ok(())
    }

    /// Peak magnitude of recently scheduled response audio, 0.0..=1.0
    ///
    /// Zero while nothing is playing and immediately after an
    /// interruption.
    pub fn activity_level(&self) -> f32 {
        **self.activity.load()
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// True while the session is open and streaming
    pub fn is_connected(&self) -> bool {
        self.state.get().is_open()
    }
}

/// Sparse peak magnitude of a sample block, clamped to 0.0..=1.0.
///
/// Sampling every 100th value is plenty for a UI-rate level meter and
/// keeps the event timeline cheap.
fn peak_activity(samples: &[f32]) -> f32 {
    samples
        .iter()
        .step_by(100)
        .fold(0.0f32, |peak, s| peak.max(s.abs()))
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_activity_empty() {
        assert_eq!(peak_activity(&[]), 0.0);
    }

    #[test]
    fn test_peak_activity_picks_sampled_peak() {
        let mut samples = vec![0.1f32; 300];
        samples[200] = -0.8; // on the stride, negative magnitude counts
        assert!((peak_activity(&samples) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_peak_activity_clamped() {
        let samples = vec![3.0f32; 1];
        assert_eq!(peak_activity(&samples), 1.0);
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = LiveSession::new(LiveConfig::new());
        assert!(session.state().is_idle());
        assert!(!session.is_connected());
        assert_eq!(session.activity_level(), 0.0);
    }

    #[tokio::test]
    async fn test_disconnect_before_connect_is_safe() {
        let mut session = LiveSession::new(LiveConfig::new());

        session.disconnect().await.unwrap();
        assert!(session.state().is_closed());

        // And again
        session.disconnect().await.unwrap();
        assert!(session.state().is_closed());
    }

    #[test]
    fn test_session_event_equality() {
        assert_eq!(SessionEvent::Connected, SessionEvent::Connected);
        assert_ne!(
            SessionEvent::Error {
                message: "a".to_string()
            },
            SessionEvent::Error {
                message: "b".to_string()
            }
        );
    }
}
