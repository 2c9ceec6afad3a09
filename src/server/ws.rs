use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::model::snapshot::AnalyticsSnapshot;

/// Shared state for the push server: the live snapshot broadcast.
#[derive(Clone)]
pub struct PushState {
    pub snapshot_tx: broadcast::Sender<Arc<AnalyticsSnapshot>>,
}

/// Messages a client may send over the socket.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Restrict the stream to these symbols; an empty list means all.
    Subscribe { symbols: Vec<String> },
    Ping,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage<'a> {
    Snapshot(&'a AnalyticsSnapshot),
    Pong,
}

pub fn router(state: PushState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<PushState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Per-connection loop: forward broadcast snapshots (filtered by the
/// client's subscription) and handle subscribe/ping messages. A client
/// that falls behind the broadcast buffer skips the missed snapshots;
/// this is a live stream, not a replay log.
async fn handle_socket(mut socket: WebSocket, state: PushState) {
    let conn_id = Uuid::new_v4();
    let mut rx = state.snapshot_tx.subscribe();
    let mut subscribed: Vec<String> = Vec::new();

    tracing::info!(%conn_id, "WebSocket client connected");

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        if !subscribed.is_empty() && !subscribed.iter().any(|s| s == &snapshot.symbol) {
                            continue;
                        }
                        let msg = match serde_json::to_string(&ServerMessage::Snapshot(snapshot.as_ref())) {
                            Ok(msg) => msg,
                            Err(e) => {
                                tracing::warn!(%conn_id, error = %e, "Failed to serialize snapshot");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(%conn_id, skipped, "Slow WebSocket client, skipped snapshots");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Subscribe { symbols }) => {
                                subscribed = normalize_symbols(&symbols);
                                tracing::info!(%conn_id, symbols = ?subscribed, "Subscription updated");
                            }
                            Ok(ClientMessage::Ping) => {
                                let pong = serde_json::to_string(&ServerMessage::Pong)
                                    .unwrap_or_else(|_| "{}".to_string());
                                if socket.send(Message::Text(pong.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!(%conn_id, error = %e, "Unrecognized client message");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(%conn_id, error = %e, "WebSocket read error");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(%conn_id, "WebSocket client disconnected");
}

/// Same normalization the feed applies to its universe, so client
/// filters match snapshot symbols exactly.
fn normalize_symbols(symbols: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for sym in symbols {
        let s = sym.trim().to_ascii_uppercase();
        if !s.is_empty() && !out.iter().any(|v| v == &s) {
            out.push(s);
        }
    }
    out
}
