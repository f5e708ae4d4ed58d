/// Async tasks for driving the live WebSocket halves
///
/// The write half consumes base64 PCM frames from a channel and wraps
/// them in realtime-input messages; the read half translates server
/// frames into a flat event stream for the session controller.

use crate::network::connection::{WsReader, WsWriter};
use crate::network::messages::{RealtimeInputMessage, ServerMessage};
use crate::network::error::{NetworkError, NetworkResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Event emitted by the receiver task
///
/// One ordered stream: audio arrives in scheduling order, control
/// events in the position the server sent them.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Decoded PCM16 bytes of one response chunk
    AudioChunk(Vec<u8>),
    /// The server abandoned its in-flight response
    Interrupted,
    /// The model finished its turn
    TurnComplete,
    /// The server closed the connection
    Closed,
    /// The connection failed
    Error(String),
}

/// Sender task: forwards base64 PCM frames to the server
///
/// Reads frames from `frame_rx` until the channel closes, wrapping each
/// one in the realtime-input wire shape. A failed send ends the task;
/// channel closure sends a WebSocket close frame first.
///
/// # Returns
/// `Ok(())` when the channel closes normally, or the send error
pub async fn sender_task(
    mut ws_writer: WsWriter,
    mut frame_rx: mpsc::Receiver<String>,
) -> NetworkResult<()> {
    info!("Sender task started");

    let mut frame_count = 0u64;

    while let Some(audio_base64) = frame_rx.recv().await {
        frame_count += 1;

        let message = RealtimeInputMessage::audio(audio_base64);
        let json = serde_json::to_string(&message).map_err(NetworkError::SerializationError)?;

        if let Err(e) = ws_writer.send(Message::Text(json.into())).await {
            warn!("Failed to send audio frame #{}: {}", frame_count, e);
            return Err(NetworkError::WebSocketError(e));
        }

        debug!("Sent audio frame #{}", frame_count);
    }

    info!(
        "Sender task completed: {} frames sent, channel closed",
        frame_count
    );

    if let Err(e) = ws_writer.close().await {
        warn!("Failed to close WebSocket writer: {}", e);
    }

    Ok(())
}

/// Receiver task: translates server frames into `ServerEvent`s
///
/// Reads until the stream ends, forwarding events through `event_tx`.
/// Audio payloads are base64-decoded here so the controller receives
/// raw PCM16 bytes. Within one server frame, audio is emitted before
/// the interruption flag so a trailing chunk is never lost. A malformed
/// frame is logged and skipped, not treated as fatal.
pub async fn receiver_task(
    mut ws_reader: WsReader,
    event_tx: mpsc::Sender<ServerEvent>,
) -> NetworkResult<()> {
    info!("Receiver task started");

    let mut message_count = 0u64;

    while let Some(msg_result) = ws_reader.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(server_msg) => {
                        message_count += 1;
                        if !dispatch_message(&server_msg, &event_tx).await {
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        warn!("Skipping malformed server frame: {}", e);
                    }
                }
            }
            Ok(Message::Binary(data)) => {
                // The endpoint may deliver JSON in binary frames.
                match serde_json::from_slice::<ServerMessage>(&data) {
                    Ok(server_msg) => {
                        message_count += 1;
                        if !dispatch_message(&server_msg, &event_tx).await {
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        warn!("Skipping malformed binary frame: {}", e);
                    }
                }
            }
            Ok(Message::Close(frame)) => {
                info!("Received close frame: {:?}", frame);
                let _ = event_tx.send(ServerEvent::Closed).await;
                return Ok(());
            }
            Ok(Message::Ping(data)) => {
                debug!("Received ping, length: {} bytes", data.len());
                // Pong is handled automatically by the underlying library
            }
            Ok(Message::Pong(_)) => {
                debug!("Received pong");
            }
            Ok(msg) => {
                debug!("Ignoring unexpected message type: {:?}", msg);
            }
            Err(e) => {
                warn!("WebSocket error: {}", e);
                let _ = event_tx.send(ServerEvent::Error(e.to_string())).await;
                return Err(NetworkError::WebSocketError(e));
            }
        }
    }

    info!(
        "Receiver task completed: {} messages received, stream ended",
        message_count
    );

    let _ = event_tx.send(ServerEvent::Closed).await;

    Ok(())
}

/// Forward the events carried by one server frame. Returns false when
/// the event receiver has been dropped.
async fn dispatch_message(msg: &ServerMessage, event_tx: &mpsc::Sender<ServerEvent>) -> bool {
    // Audio first, then control flags: a frame that carries both a
    // final chunk and an interruption must deliver the chunk.
    if let Some(audio_base64) = msg.audio_data() {
        match BASE64.decode(audio_base64) {
            Ok(bytes) => {
                if event_tx.send(ServerEvent::AudioChunk(bytes)).await.is_err() {
                    debug!("Event receiver dropped; stopping receiver task");
                    return false;
                }
            }
            Err(e) => {
                warn!("Dropping audio chunk with invalid base64: {}", e);
            }
        }
    }

    if msg.is_interrupted() {
        if event_tx.send(ServerEvent::Interrupted).await.is_err() {
            return false;
        }
    }

    if msg.is_turn_complete() {
        if event_tx.send(ServerEvent::TurnComplete).await.is_err() {
            return false;
        }
    }

    true
}
