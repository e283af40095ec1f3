//! `WebSocket` push channel.
//!
//! Observers connect to `GET /ws`. Each connection is registered with the
//! [`SessionRegistry`](crate::session::SessionRegistry), which queues the
//! `init` handshake and then every broadcast frame. The handler forwards
//! queued messages to the socket as JSON text frames and answers inbound
//! `capture` requests by writing a `captureAck` straight to the socket, so
//! a full frame queue never costs the requester its acknowledgement.
//!
//! Unknown or unparseable inbound messages are ignored.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use echo_eyes_types::{ClientMessage, ServerMessage};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` observer session.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_observer(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Drive one observer session until either side goes away or the server
/// shuts down.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let mut session = state.sessions.connect();
    let id = session.id;
    info!(session = %id, "Client connected");

    loop {
        tokio::select! {
            () = state.shutdown.cancelled() => {
                if socket.send(Message::Close(None)).await.is_err() {
                    debug!(session = %id, "WebSocket close failed");
                }
                break;
            }
            // Handshake and frames queued for this observer.
            outbound = session.outbound.recv() => {
                let Some(message) = outbound else {
                    debug!(session = %id, "Session queue closed");
                    break;
                };
                if !send_json(&mut socket, &message).await {
                    debug!(session = %id, "WebSocket send failed");
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => match ClientMessage::parse(text.as_str()) {
                        Some(ClientMessage::Capture(request)) => {
                            let ack = state.sessions.handle_capture(id, &request);
                            let reply = ServerMessage::CaptureAck(ack);
                            if !send_json(&mut socket, &reply).await {
                                debug!(session = %id, "WebSocket send failed");
                                break;
                            }
                        }
                        None => {
                            debug!(session = %id, "Ignoring unrecognized client message");
                        }
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(session = %id, "WebSocket pong failed");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(session = %id, "WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary and pong frames carry nothing for us.
                    }
                }
            }
        }
    }

    state.sessions.disconnect(id);
    info!(session = %id, "Client disconnected");
}

/// Serialize and send one message. Returns `false` if the socket is gone.
async fn send_json(socket: &mut WebSocket, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize observer message: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}
