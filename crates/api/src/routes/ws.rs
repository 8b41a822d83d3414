//! WebSocket endpoint feeding the session registry.
//!
//! On upgrade the connection is registered with the caller's identity and
//! drains its event channel into the socket until either side closes. The
//! push direction is server-to-client only; incoming frames other than
//! close are ignored.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use realtime::SessionRegistry;
use store::Store;

use crate::identity::Identity;
use crate::routes::orders::AppState;

/// GET /ws — upgrade to the real-time event stream.
pub async fn upgrade<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    ws: WebSocketUpgrade,
) -> Response {
    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, registry, identity))
}

async fn handle_socket(mut socket: WebSocket, registry: Arc<SessionRegistry>, identity: Identity) {
    let (session_id, mut events) = registry.register(identity.user_id, identity.role);
    metrics::gauge!("ws_sessions_connected").increment(1.0);
    tracing::debug!(session = %session_id, user = %identity.user_id, "websocket connected");

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, kind = event.kind(), "failed to encode event");
                    }
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    None | Some(Ok(Message::Close(_))) | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    registry.unregister(session_id);
    metrics::gauge!("ws_sessions_connected").decrement(1.0);
    tracing::debug!(session = %session_id, "websocket disconnected");
}
