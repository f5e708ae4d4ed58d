/// Wire message types for the bidirectional live voice endpoint
///
/// The endpoint speaks JSON over a websocket: the client opens with a
/// `setup` frame, then streams base64 PCM as `realtimeInput` media
/// chunks; the server answers with `serverContent` frames carrying
/// model audio and turn control flags. All field names are camelCase on
/// the wire.

use serde::{Deserialize, Serialize};

/// Default mime type tag for outbound 16 kHz PCM
pub const INPUT_AUDIO_MIME: &str = "audio/pcm;rate=16000";

// ============================================================================
// Client -> Server Messages
// ============================================================================

/// Session handshake frame, sent once after the websocket opens.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SetupMessage {
    /// Handshake body
    pub setup: Setup,
}

/// Handshake body: model selection and response behavior
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    /// Fully-qualified model name (e.g. "models/...")
    pub model: String,

    /// Response modality and voice selection
    pub generation_config: GenerationConfig,

    /// System-level behavioral instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
}

/// Generation parameters inside the handshake
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Requested response modalities (e.g. ["AUDIO"])
    pub response_modalities: Vec<String>,

    /// Voice selection for audio responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

/// Voice selection wrapper
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    /// Voice configuration
    pub voice_config: VoiceConfig,
}

/// Voice configuration wrapper
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    /// Named prebuilt voice
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

/// Named prebuilt voice
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    /// Voice identity (e.g. "Zephyr")
    pub voice_name: String,
}

/// System instruction as a single text part
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SystemInstruction {
    /// Instruction text parts
    pub parts: Vec<TextPart>,
}

/// A bare text part
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TextPart {
    /// The text content
    pub text: String,
}

impl SystemInstruction {
    /// Wrap an instruction string in the single-part wire shape
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![TextPart { text: text.into() }],
        }
    }
}

/// Realtime audio frame, streamed while the session is open.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInputMessage {
    /// Frame body
    pub realtime_input: RealtimeInput,
}

/// Realtime frame body
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    /// Media payloads, tagged with their mime type
    pub media_chunks: Vec<MediaChunk>,
}

/// One base64-encoded media payload
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaChunk {
    /// Payload mime type (e.g. "audio/pcm;rate=16000")
    pub mime_type: String,

    /// Base64-encoded payload bytes
    pub data: String,
}

impl RealtimeInputMessage {
    /// Wrap one base64 PCM payload in the realtime frame shape
    pub fn audio(data_base64: impl Into<String>) -> Self {
        Self {
            realtime_input: RealtimeInput {
                media_chunks: vec![MediaChunk {
                    mime_type: INPUT_AUDIO_MIME.to_string(),
                    data: data_base64.into(),
                }],
            },
        }
    }
}

// ============================================================================
// Server -> Client Messages
// ============================================================================

/// A frame from the server.
///
/// Exactly one of the optional sections is normally present; unknown
/// sections are ignored so protocol additions do not break the client.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    /// Handshake acknowledgement
    #[serde(default)]
    pub setup_complete: Option<SetupComplete>,

    /// Model response content
    #[serde(default)]
    pub server_content: Option<ServerContent>,
}

/// Empty handshake acknowledgement body
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SetupComplete {}

/// Model response content and turn control flags
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    /// Partial model turn carrying audio parts
    #[serde(default)]
    pub model_turn: Option<ModelTurn>,

    /// The server abandoned its in-flight response
    #[serde(default)]
    pub interrupted: Option<bool>,

    /// The model finished its turn
    #[serde(default)]
    pub turn_complete: Option<bool>,
}

/// Partial model turn
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ModelTurn {
    /// Response parts in order
    #[serde(default)]
    pub parts: Vec<ServerPart>,
}

/// One response part: text or inline binary data
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerPart {
    /// Text content, when present
    #[serde(default)]
    pub text: Option<String>,

    /// Inline binary content, when present
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

/// Base64-encoded inline binary content
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// Payload mime type (e.g. "audio/pcm;rate=24000")
    pub mime_type: String,

    /// Base64-encoded payload bytes
    pub data: String,
}

impl ServerMessage {
    /// True when this frame acknowledges the handshake
    pub fn is_setup_complete(&self) -> bool {
        self.setup_complete.is_some()
    }

    /// Base64 audio payload of the first inline-data part, if any
    pub fn audio_data(&self) -> Option<&str> {
        self.server_content
            .as_ref()?
            .model_turn
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| part.inline_data.as_ref())
            .map(|inline| inline.data.as_str())
    }

    /// True when the server signalled an interruption
    pub fn is_interrupted(&self) -> bool {
        self.server_content
            .as_ref()
            .and_then(|content| content.interrupted)
            .unwrap_or(false)
    }

    /// True when the model finished its turn
    pub fn is_turn_complete(&self) -> bool {
        self.server_content
            .as_ref()
            .and_then(|content| content.turn_complete)
            .unwrap_or(false)
    }
}
