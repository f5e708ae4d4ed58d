/// Integration tests for the REST generateContent wire shapes
///
/// Validates request construction and response parsing for the text
/// chat and image generation calls.

use nexus_live::genai::*;
use serde_json::Value;

#[test]
fn test_chat_request_shape() {
    println!("\n=== Chat Request Shape ===");

    let request = GenerateContentRequest {
        contents: vec![Content::user(vec![Part::text("What is Rust?")])],
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part::text(DEFAULT_CHAT_INSTRUCTION)],
        }),
    };

    let json = serde_json::to_string(&request).unwrap();
    println!("Request JSON:\n{}", json);

    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["contents"][0]["role"], "user");
    assert_eq!(value["contents"][0]["parts"][0]["text"], "What is Rust?");
    assert!(value["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Nexus"));

    println!("✓ Chat request well-formed");
}

#[test]
fn test_vision_request_orders_image_before_text() {
    let request = GenerateContentRequest {
        contents: vec![Content::user(vec![
            Part::inline("image/jpeg", "ZmFrZQ=="),
            Part::text("What is in this photo?"),
        ])],
        system_instruction: None,
    };

    let value: Value = serde_json::to_value(&request).unwrap();
    let parts = value["contents"][0]["parts"].as_array().unwrap();

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[1]["text"], "What is in this photo?");
}

#[test]
fn test_text_response_parsing() {
    let json = r#"{
        "candidates": [
            {
                "content": {
                    "role": "model",
                    "parts": [{"text": "Rust is "}, {"text": "a systems language."}]
                },
                "finishReason": "STOP"
            }
        ],
        "usageMetadata": {"totalTokenCount": 12}
    }"#;

    let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
    assert_eq!(
        response.text(),
        Some("Rust is a systems language.".to_string())
    );
}

#[test]
fn test_image_response_parsing() {
    println!("\n=== Image Response ===");

    let json = r#"{
        "candidates": [
            {
                "content": {
                    "parts": [
                        {"text": "Here is your image:"},
                        {"inlineData": {"mimeType": "image/png", "data": "aW1hZ2U="}}
                    ]
                }
            }
        ]
    }"#;

    let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
    let image = response.inline_data().unwrap();

    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.data, "aW1hZ2U=");

    println!("✓ Image payload extracted");
}

#[test]
fn test_empty_candidates_yield_nothing() {
    let response: GenerateContentResponse =
        serde_json::from_str(r#"{"candidates": []}"#).unwrap();

    assert_eq!(response.text(), None);
    assert!(response.inline_data().is_none());
}

#[test]
fn test_model_name_constants() {
    // The three surfaces use distinct models.
    assert_ne!(DEFAULT_TEXT_MODEL, DEFAULT_IMAGE_MODEL);
    assert!(!DEFAULT_TEXT_MODEL.is_empty());
    assert!(!DEFAULT_IMAGE_MODEL.is_empty());
}
