/// WebSocket connection to the live bidirectional voice endpoint
///
/// This module provides the WebSocket client used for streaming voice
/// sessions: URL construction, the setup handshake, and the message
/// send/receive primitives.

use crate::network::error::{NetworkError, NetworkResult};
use crate::network::messages::{
    GenerationConfig, PrebuiltVoiceConfig, RealtimeInputMessage, ServerMessage, Setup,
    SetupMessage, SpeechConfig, SystemInstruction, VoiceConfig,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of the WebSocket stream
pub type WsWriter = SplitSink<WsStream, Message>;

/// Read half of the WebSocket stream
pub type WsReader = SplitStream<WsStream>;

/// Default native-audio live model
pub const DEFAULT_LIVE_MODEL: &str = "models/gemini-2.5-flash-native-audio-preview-12-2025";

/// Default prebuilt voice for audio responses
pub const DEFAULT_VOICE: &str = "Zephyr";

/// Default behavioral instruction for voice sessions
pub const DEFAULT_LIVE_INSTRUCTION: &str = "You are Nexus. Keep voice responses short and human-like.";

const DEFAULT_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Configuration for a live voice session
///
/// # Example
/// ```no_run
/// use nexus_live::network::LiveConfig;
///
/// let config = LiveConfig::new()
///     .with_voice("Zephyr")
///     .with_timeout(5000);
/// ```
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Fully-qualified model name
    pub model: String,

    /// Prebuilt voice name for audio responses
    pub voice: String,

    /// System-level behavioral instruction
    pub system_instruction: Option<String>,

    /// Requested response modalities
    pub response_modalities: Vec<String>,

    /// Connection timeout in milliseconds
    pub timeout_ms: u64,

    /// WebSocket endpoint (overridable for testing)
    pub endpoint: String,
}

impl LiveConfig {
    /// Create a configuration with the default audio-native model and voice
    pub fn new() -> Self {
        Self {
            model: DEFAULT_LIVE_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            system_instruction: Some(DEFAULT_LIVE_INSTRUCTION.to_string()),
            response_modalities: vec!["AUDIO".to_string()],
            timeout_ms: 10000, // 10 seconds default
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Set the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the prebuilt voice
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Set the system instruction
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Set connection timeout in milliseconds
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Override the WebSocket endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Build the WebSocket URL carrying the API key
    pub fn build_url(&self, api_key: &str) -> NetworkResult<String> {
        if api_key.is_empty() {
            return Err(NetworkError::InvalidConfig(
                "API key must not be empty".to_string(),
            ));
        }
        Ok(format!("{}?key={}", self.endpoint, api_key))
    }

    /// Build the setup handshake message for this configuration
    pub fn setup_message(&self) -> SetupMessage {
        SetupMessage {
            setup: Setup {
                model: self.model.clone(),
                generation_config: GenerationConfig {
                    response_modalities: self.response_modalities.clone(),
                    speech_config: Some(SpeechConfig {
                        voice_config: VoiceConfig {
                            prebuilt_voice_config: PrebuiltVoiceConfig {
                                voice_name: self.voice.clone(),
                            },
                        },
                    }),
                },
                system_instruction: self
                    .system_instruction
                    .as_deref()
                    .map(SystemInstruction::from_text),
            },
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket connection to the live voice endpoint
///
/// Manages the connection lifecycle: opening the socket, completing the
/// setup handshake, streaming realtime audio, and closing.
///
/// # Example
/// ```no_run
/// use nexus_live::network::{LiveConfig, LiveConnection};
///
/// #[tokio::main]
/// async fn main() {
///     let config = LiveConfig::new();
///     let mut conn = LiveConnection::connect("your-api-key", &config)
///         .await
///         .unwrap();
///
///     // Use the connection...
///     conn.close().await.unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct LiveConnection {
    /// WebSocket stream
    ws_stream: WsStream,

    /// Whether the connection is open
    is_open: bool,
}

impl LiveConnection {
    /// Connect to the live endpoint and complete the setup handshake
    ///
    /// Opens the WebSocket, sends the `setup` frame built from `config`,
    /// and waits for the server's `setupComplete` acknowledgement.
    ///
    /// # Arguments
    /// * `api_key` - API key for authentication
    /// * `config` - Session configuration
    ///
    /// # Errors
    /// `AuthenticationFailed` on a 401/403 upgrade response, `Timeout`
    /// when the handshake does not complete in time, `ConnectionClosed`
    /// when the server closes before acknowledging setup.
    pub async fn connect(api_key: &str, config: &LiveConfig) -> NetworkResult<Self> {
        info!("Connecting to live voice endpoint");

        let url = config.build_url(api_key)?;

        // Connect with timeout
        let connect_future = connect_async(url.as_str());
        let timeout = tokio::time::Duration::from_millis(config.timeout_ms);

        let (ws_stream, response) = tokio::time::timeout(timeout, connect_future)
            .await
            .map_err(|_| NetworkError::Timeout(config.timeout_ms))?
            .map_err(|e| {
                if let tokio_tungstenite::tungstenite::Error::Http(resp) = &e {
                    if resp.status() == 401 || resp.status() == 403 {
                        return NetworkError::AuthenticationFailed;
                    }
                }
                NetworkError::ConnectionFailed(e.to_string())
            })?;

        info!("Connected to live endpoint (status: {})", response.status());

        let mut conn = Self {
            ws_stream,
            is_open: true,
        };

        // Handshake: send setup, wait for setupComplete.
        conn.send(&config.setup_message()).await?;

        let deadline = tokio::time::Duration::from_millis(config.timeout_ms);
        let ack = tokio::time::timeout(deadline, conn.recv())
            .await
            .map_err(|_| NetworkError::Timeout(config.timeout_ms))??;

        match ack {
            Some(msg) if msg.is_setup_complete() => {
                info!("Live session setup complete (model: {})", config.model);
                Ok(conn)
            }
            Some(msg) => {
                warn!("Unexpected handshake response: {:?}", msg);
                let _ = conn.close().await;
                Err(NetworkError::ServerError(
                    "handshake did not complete".to_string(),
                ))
            }
            None => Err(NetworkError::ConnectionClosed),
        }
    }

    /// Send a message to the server
    ///
    /// Serializes the message to JSON and sends it as a text frame.
    ///
    /// # Errors
    /// Returns `NetworkError` if serialization or sending fails
    pub async fn send<T: Serialize>(&mut self, message: &T) -> NetworkResult<()> {
        if !self.is_open {
            return Err(NetworkError::ConnectionClosed);
        }

        let json = serde_json::to_string(message)?;
        debug!("Sending message: {} bytes", json.len());

        self.ws_stream
            .send(Message::Text(json.into()))
            .await
            .map_err(NetworkError::WebSocketError)?;

        Ok(())
    }

    /// Stream one base64-encoded PCM frame to the server
    ///
    /// Frames offered while the connection is not open are dropped
    /// silently, so capture can keep producing across reconnect gaps.
    pub async fn send_realtime_audio(&mut self, audio_base64: String) -> NetworkResult<()> {
        if !self.is_open {
            debug!("Dropping audio frame: connection not open");
            return Ok(());
        }

        self.send(&RealtimeInputMessage::audio(audio_base64)).await
    }

    /// Receive the next message from the server
    ///
    /// # Returns
    /// * `Ok(Some(message))` - A message was received
    /// * `Ok(None)` - Connection closed gracefully
    /// * `Err(error)` - An error occurred
    pub async fn recv(&mut self) -> NetworkResult<Option<ServerMessage>> {
        if !self.is_open {
            return Ok(None);
        }

        match self.ws_stream.next().await {
            Some(Ok(Message::Text(text))) => {
                debug!("Received message: {} bytes", text.len());
                let message: ServerMessage = serde_json::from_str(&text)?;
                Ok(Some(message))
            }
            Some(Ok(Message::Binary(data))) => {
                // The endpoint may deliver JSON in binary frames.
                let message: ServerMessage = serde_json::from_slice(&data)?;
                Ok(Some(message))
            }
            Some(Ok(Message::Close(frame))) => {
                info!("Received close frame: {:?}", frame);
                self.is_open = false;
                Ok(None)
            }
            Some(Ok(Message::Ping(data))) => {
                debug!("Received ping, sending pong");
                self.ws_stream.send(Message::Pong(data)).await?;
                Box::pin(self.recv()).await
            }
            Some(Ok(Message::Pong(_))) => {
                debug!("Received pong");
                Box::pin(self.recv()).await
            }
            Some(Ok(msg)) => {
                warn!("Received unexpected message type: {:?}", msg);
                Box::pin(self.recv()).await
            }
            Some(Err(e)) => {
                self.is_open = false;
                Err(NetworkError::WebSocketError(e))
            }
            None => {
                info!("WebSocket stream ended");
                self.is_open = false;
                Ok(None)
            }
        }
    }

    /// Close the WebSocket connection
    ///
    /// Sends a close frame. Calling close on an already-closed connection
    /// is a no-op.
    pub async fn close(&mut self) -> NetworkResult<()> {
        if !self.is_open {
            return Ok(());
        }

        info!("Closing WebSocket connection");

        self.ws_stream
            .close(None)
            .await
            .map_err(NetworkError::WebSocketError)?;

        self.is_open = false;
        info!("WebSocket connection closed");

        Ok(())
    }

    /// Check if the connection is open
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Split the connection into separate read and write halves
    ///
    /// This consumes the connection and returns the halves, which can be
    /// driven independently in separate tasks.
    pub fn split(self) -> (WsWriter, WsReader) {
        self.ws_stream.split()
    }
}
