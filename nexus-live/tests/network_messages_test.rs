/// Integration tests for the live endpoint wire protocol
///
/// Validates the JSON shapes exchanged with the bidirectional voice
/// endpoint: the setup handshake, realtime audio frames, and server
/// content messages.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use nexus_live::network::messages::*;
use nexus_live::network::LiveConfig;
use serde_json::Value;

#[test]
fn test_setup_handshake_full_shape() {
    println!("\n=== Setup Handshake Shape ===");

    let config = LiveConfig::new();
    let msg = config.setup_message();
    let json = serde_json::to_string(&msg).unwrap();
    println!("Setup JSON:\n{}", json);

    let value: Value = serde_json::from_str(&json).unwrap();
    let setup = &value["setup"];

    assert!(setup["model"].as_str().unwrap().starts_with("models/"));
    assert_eq!(
        setup["generationConfig"]["responseModalities"][0],
        Value::String("AUDIO".to_string())
    );
    assert_eq!(
        setup["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
            ["voiceName"],
        Value::String("Zephyr".to_string())
    );
    assert!(setup["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Nexus"));

    println!("✓ Handshake carries model, modality, voice and instruction");
}

#[test]
fn test_realtime_audio_frame_shape() {
    println!("\n=== Realtime Audio Frame ===");

    let pcm = vec![0x12u8, 0x34, 0x56, 0x78];
    let msg = RealtimeInputMessage::audio(BASE64.encode(&pcm));
    let json = serde_json::to_string(&msg).unwrap();
    println!("Frame JSON: {}", json);

    let value: Value = serde_json::from_str(&json).unwrap();
    let chunk = &value["realtimeInput"]["mediaChunks"][0];

    assert_eq!(chunk["mimeType"], "audio/pcm;rate=16000");
    assert_eq!(
        BASE64.decode(chunk["data"].as_str().unwrap()).unwrap(),
        pcm
    );

    println!("✓ Frame wraps base64 PCM with the 16 kHz mime tag");
}

#[test]
fn test_server_message_response_sequence() {
    println!("\n=== Server Response Sequence ===");

    // A realistic turn: setupComplete, audio chunks, then turnComplete.
    let frames = [
        r#"{"setupComplete":{}}"#,
        r#"{"serverContent":{"modelTurn":{"parts":[{"inlineData":{"mimeType":"audio/pcm;rate=24000","data":"AAAAAA=="}}]}}}"#,
        r#"{"serverContent":{"modelTurn":{"parts":[{"inlineData":{"mimeType":"audio/pcm;rate=24000","data":"//8AAA=="}}]}}}"#,
        r#"{"serverContent":{"turnComplete":true}}"#,
    ];

    let messages: Vec<ServerMessage> = frames
        .iter()
        .map(|f| serde_json::from_str(f).unwrap())
        .collect();

    assert!(messages[0].is_setup_complete());
    assert!(messages[1].audio_data().is_some());
    assert!(messages[2].audio_data().is_some());
    assert!(messages[3].is_turn_complete());
    assert!(!messages[3].is_interrupted());

    println!("✓ Full turn sequence parsed");
}

#[test]
fn test_server_interruption_with_trailing_audio() {
    // The server may flag interruption in the same frame as final audio.
    let json = r#"{
        "serverContent": {
            "modelTurn": {"parts": [{"inlineData": {"mimeType": "audio/pcm", "data": "AAAA"}}]},
            "interrupted": true
        }
    }"#;

    let msg: ServerMessage = serde_json::from_str(json).unwrap();
    assert!(msg.audio_data().is_some());
    assert!(msg.is_interrupted());
}

#[test]
fn test_server_message_tolerates_additions() {
    // Unknown top-level and nested fields must not break parsing.
    let json = r#"{
        "serverContent": {
            "modelTurn": {"parts": [{"text": "thinking...", "thought": true}]},
            "groundingMetadata": {}
        },
        "usageMetadata": {"totalTokenCount": 7}
    }"#;

    let msg: ServerMessage = serde_json::from_str(json).unwrap();
    assert!(msg.server_content.is_some());
    assert!(msg.audio_data().is_none());
}

#[test]
fn test_live_config_url() {
    let config = LiveConfig::new().with_endpoint("wss://example.test/live");
    let url = config.build_url("k-123").unwrap();

    assert_eq!(url, "wss://example.test/live?key=k-123");
}
