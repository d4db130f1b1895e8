//! Axum WebSocket handler
//!
//! Upgrades `/ws/audio`, bridges the socket to a [`SessionLoop`] and runs the
//! single writer task that owns the socket's send half.

use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt, future};
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};
use tracing::{debug, error, info, warn};

use crate::core::session::{InboundFrame, MessageRoute, OutgoingMessage, SessionLoop};
use crate::state::AppState;

/// Outbound frames queued ahead of the socket writer
const CHANNEL_BUFFER_SIZE: usize = 64;

/// How long the writer may take to flush after the session ends
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket voice session handler
/// Upgrades the HTTP connection and runs one voice session on it
pub async fn ws_audio_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("WebSocket audio connection upgrade requested");
    ws.on_upgrade(move |socket| handle_audio_socket(socket, state))
}

async fn handle_audio_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let (sender, receiver) = socket.split();
    let (message_tx, message_rx) = mpsc::channel::<MessageRoute>(CHANNEL_BUFFER_SIZE);

    let mut writer = tokio::spawn(write_routes(sender, message_rx));

    let core = &app_state.core_state;
    let session = SessionLoop::new(
        core.services.clone(),
        Arc::clone(&core.session_config),
        message_tx,
    )
    .with_archive(Arc::clone(&core.archive));
    let session_id = session.session_id().to_string();
    info!("[{}] WebSocket audio connection established", session_id);

    let inbound = receiver.filter_map(|msg| future::ready(inbound_frame(msg)));
    let summary = session.run(inbound).await;

    // The session dropped its sender; let the writer flush what is queued.
    if timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        warn!("[{}] Writer did not drain in time", session_id);
        writer.abort();
    }

    info!(
        "[{}] WebSocket audio connection terminated: {} replies, {} interruptions",
        session_id, summary.stats.replies_delivered, summary.stats.interruptions
    );
}

/// Map a raw socket event to what the session understands.
///
/// Ping and pong are answered by axum and never reach the session.
pub(crate) fn inbound_frame<E: Display>(msg: Result<Message, E>) -> Option<InboundFrame> {
    match msg {
        Ok(Message::Text(text)) => {
            debug!("Received text message: {} bytes", text.len());
            Some(InboundFrame::from_text(text.as_str()))
        }
        Ok(Message::Binary(data)) => {
            debug!("Received binary message: {} bytes", data.len());
            Some(InboundFrame::Malformed(
                "binary frames are not supported".to_string(),
            ))
        }
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
        Ok(Message::Close(_)) => Some(InboundFrame::Closed),
        Err(e) => {
            warn!("WebSocket error: {}", e);
            Some(InboundFrame::TransportError(format!("WebSocket error: {e}")))
        }
    }
}

/// Drain `routes` onto the socket in order until the session closes it.
pub(crate) async fn write_routes<S>(mut sender: S, mut routes: mpsc::Receiver<MessageRoute>)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(route) = routes.recv().await {
        let result = match route {
            MessageRoute::Outgoing(message) => send_json(&mut sender, &message).await,
            MessageRoute::Delivery { message, written } => {
                let result = send_json(&mut sender, &message).await;
                if result.is_ok() {
                    let _ = written.send(());
                }
                result
            }
            MessageRoute::Close => {
                if let Err(e) = sender.send(Message::Close(None)).await {
                    debug!("Failed to send close frame: {}", e);
                }
                break;
            }
        };

        if let Err(e) = result {
            error!("Failed to send WebSocket message: {}", e);
            break;
        }
    }
}

async fn send_json<S>(sender: &mut S, message: &OutgoingMessage) -> Result<(), S::Error>
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(message) {
        Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
        Err(e) => {
            error!("Failed to serialize outgoing message: {}", e);
            Ok(())
        }
    }
}
