use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde_json::json;
use tokio_stream::wrappers::IntervalStream;
use tracing::{info, warn};

use crate::api::rest::auth::AuthSession;
use crate::api::rest::map::load_snapshot;
use crate::error::AppError;
use crate::models::session::Session;
use crate::state::AppState;

const SESSION_EXPIRED_CLOSE_CODE: u16 = 4401;

pub async fn live_map(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state, session))
}

fn session_expired() -> Message {
    Message::Close(Some(CloseFrame {
        code: SESSION_EXPIRED_CLOSE_CODE,
        reason: "session expired".into(),
    }))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, session: Session) {
    let (mut sender, mut receiver) = socket.split();
    let session_id = session.id;

    state.metrics.live_map_subscribers.inc();
    info!(session = %session_id, "live map client connected");

    let poll_state = state.clone();
    let mut send_task = tokio::spawn(async move {
        let mut ticks =
            IntervalStream::new(tokio::time::interval(poll_state.config.map_poll_interval));

        while ticks.next().await.is_some() {
            // Each tick counts as use; a signed-out session ends the feed.
            let Some(session) = poll_state.session(&session_id) else {
                info!(session = %session_id, "live map session ended");
                let _ = sender.send(session_expired()).await;
                break;
            };

            let snapshot = match load_snapshot(&poll_state, &session).await {
                Ok(snapshot) => snapshot,
                Err(AppError::Unauthorized(message)) => {
                    warn!(session = %session_id, %message, "live map session rejected by backend");
                    poll_state.close_session(&session_id);
                    let _ = sender.send(session_expired()).await;
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "live map refresh failed");
                    let frame = json!({ "error": err.message() }).to_string();
                    if sender.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                    continue;
                }
            };

            let json = match serde_json::to_string(&snapshot) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize map snapshot for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    // Whichever side finishes first stops the other, so polling ends with the socket.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.metrics.live_map_subscribers.dec();
    info!(session = %session_id, "live map client disconnected");
}
