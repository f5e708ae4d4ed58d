/// REST client for text and image generation
///
/// Companion to the live voice session: one-shot `generateContent`
/// requests for chat replies (optionally with an attached image) and
/// image generation. Shares the API key with the live endpoint.

use crate::network::error::{NetworkError, NetworkResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default text chat model
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";

/// Default image generation model
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Default behavioral instruction for text chat
pub const DEFAULT_CHAT_INSTRUCTION: &str =
    "You are Nexus, a world-class AI assistant. You are concise, brilliant, and helpful.";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One content part: text or inline base64 data
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text content
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,

    /// Inline base64-encoded binary content
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inline_data: Option<InlineData>,
}

/// Base64-encoded inline binary content
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// Payload mime type (e.g. "image/jpeg")
    pub mime_type: String,

    /// Base64-encoded payload bytes
    pub data: String,
}

impl Part {
    /// A bare text part
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// An inline-data part
    pub fn inline(mime_type: impl Into<String>, data_base64: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data_base64.into(),
            }),
        }
    }
}

/// A role-tagged turn of content
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Content {
    /// "user" or "model"
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,

    /// Parts of this turn, in order
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn with the given parts
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }
}

/// Request body for a `generateContent` call
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns
    pub contents: Vec<Content>,

    /// System-level behavioral instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

/// Response body of a `generateContent` call
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct GenerateContentResponse {
    /// Response candidates, best first
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One response candidate
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Candidate {
    /// The candidate's content
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// First inline-data part of the first candidate, if any
    pub fn inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| part.inline_data.as_ref())
    }
}

/// HTTP client for the generative REST endpoint
///
/// # Example
/// ```no_run
/// use nexus_live::genai::GenAiClient;
///
/// #[tokio::main]
/// async fn main() {
///     let client = GenAiClient::new("your-api-key");
///     let reply = client.send_message("Hello!", None).await.unwrap();
///     println!("{}", reply);
/// }
/// ```
pub struct GenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GenAiClient {
    /// Create a client against the production endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the base URL (for testing against a local server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Issue one `generateContent` call against `model`
    ///
    /// # Errors
    /// `AuthenticationFailed` on 401/403, `ServerError` with the response
    /// body on any other non-success status.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> NetworkResult<GenerateContentResponse> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        debug!("POST generateContent (model: {})", model);

        let response = self.http.post(&url).json(request).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(NetworkError::AuthenticationFailed);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetworkError::ServerError(format!(
                "{}: {}",
                status, body
            )));
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }

    /// Send a chat message, optionally with an attached JPEG image
    ///
    /// # Arguments
    /// * `message` - The user's message text
    /// * `image_base64` - Optional base64-encoded JPEG to attach
    ///
    /// # Returns
    /// The model's text reply
    pub async fn send_message(
        &self,
        message: &str,
        image_base64: Option<&str>,
    ) -> NetworkResult<String> {
        let mut parts = Vec::new();
        if let Some(image) = image_base64 {
            parts.push(Part::inline("image/jpeg", image));
        }
        parts.push(Part::text(message));

        let request = GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(DEFAULT_CHAT_INSTRUCTION)],
            }),
        };

        let response = self.generate_content(DEFAULT_TEXT_MODEL, &request).await?;

        response
            .text()
            .ok_or_else(|| NetworkError::ServerError("response carried no text".to_string()))
    }

    /// Generate an image from a text prompt
    ///
    /// # Returns
    /// The base64-encoded image bytes and their mime type
    pub async fn generate_image(&self, prompt: &str) -> NetworkResult<InlineData> {
        info!("Generating image");

        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            system_instruction: None,
        };

        let response = self.generate_content(DEFAULT_IMAGE_MODEL, &request).await?;

        response
            .inline_data()
            .cloned()
            .ok_or_else(|| NetworkError::ServerError("response carried no image".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text("hi")])],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text("Be helpful.")],
            }),
        };

        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("\"contents\":[{\"role\":\"user\",\"parts\":[{\"text\":\"hi\"}]}]"));
        assert!(json.contains("\"systemInstruction\":{\"parts\":[{\"text\":\"Be helpful.\"}]}"));
    }

    #[test]
    fn test_request_with_inline_image() {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline("image/jpeg", "abc123"),
                Part::text("describe this"),
            ])],
            system_instruction: None,
        };

        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("\"inlineData\":{\"mimeType\":\"image/jpeg\",\"data\":\"abc123\"}"));
        assert!(!json.contains("systemInstruction"));
    }

    #[test]
    fn test_response_text_concatenation() {
        let json = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]}}
            ]
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Hello, world".to_string()));
    }

    #[test]
    fn test_response_inline_data() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [
                    {"text": "here you go"},
                    {"inlineData": {"mimeType": "image/png", "data": "iVBOR"}}
                ]}}
            ]
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let image = response.inline_data().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBOR");
    }

    #[test]
    fn test_empty_response_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), None);
        assert!(response.inline_data().is_none());
    }
}
