//! WebSocket layer for the realtime change feed.
//!
//! Connection lifecycle:
//! 1. Client calls `POST /api/auth/ws-ticket` to get a one-time ticket
//! 2. Client opens `GET /ws/connect?ticket=xxx` — ticket validated, WS upgraded
//! 3. Server sends Welcome, then forwards change events the caller's
//!    scope may observe (the row policy is re-evaluated per event)
//! 4. Heartbeat every 30s — 3 missed = disconnect

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Scope;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth;
use crate::realtime::ChangeEvent;

/// Heartbeat interval: server sends Heartbeat every 30 seconds.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Disconnect after this many missed heartbeats (3 × 30s = 90s).
const MAX_MISSED_HEARTBEATS: u32 = 3;

/// Query parameters for WebSocket upgrade.
#[derive(Deserialize)]
pub struct WsAuthQuery {
    ticket: String,
}

/// Messages sent to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsOutgoing {
    Welcome { account_id: Uuid },
    Heartbeat,
    Change(ChangeEvent),
}

/// Messages received from the client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsIncoming {
    Pong {},
}

// ═══════════════════════════════════════════════════════════
// WsSessionState — testable heartbeat bookkeeping
// ═══════════════════════════════════════════════════════════

/// Action returned by `WsSessionState::on_heartbeat_tick()`.
#[derive(Debug, PartialEq)]
pub(crate) enum HeartbeatAction {
    /// Send a heartbeat and continue.
    SendHeartbeat,
    /// Too many missed heartbeats — disconnect.
    HeartbeatTimeout,
}

/// Heartbeat state, extracted from `handle_ws` so the miss/reset logic
/// is unit-testable without a live WebSocket.
pub(crate) struct WsSessionState {
    missed_heartbeats: u32,
}

impl WsSessionState {
    fn new() -> Self {
        Self {
            missed_heartbeats: 0,
        }
    }

    /// Called when a Pong is received from the client.
    fn on_pong(&mut self) {
        self.missed_heartbeats = 0;
    }

    /// Called on each heartbeat tick. Returns the action to take.
    fn on_heartbeat_tick(&mut self) -> HeartbeatAction {
        if self.missed_heartbeats >= MAX_MISSED_HEARTBEATS {
            return HeartbeatAction::HeartbeatTimeout;
        }
        self.missed_heartbeats += 1;
        HeartbeatAction::SendHeartbeat
    }
}

/// WebSocket upgrade handler.
///
/// Validates the one-time ticket, resolves the caller's identity and
/// scope, then upgrades.
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(ctx): State<ApiContext>,
    Query(query): Query<WsAuthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = {
        let mut tickets = ctx
            .ws_tickets
            .lock()
            .map_err(|_| ApiError::Internal("ticket lock".into()))?;
        tickets.consume(&query.ticket).ok_or(ApiError::Unauthorized)?
    };

    let scope = {
        let conn = ctx.state.db()?;
        auth::identity_for_account(&conn, &account_id)?.scope()
    };

    tracing::info!(account_id = %account_id, "WebSocket upgrade accepted");
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, ctx, account_id, scope)))
}

/// Main WebSocket connection handler: forwards scoped change events,
/// runs the heartbeat, and exits on disconnect or timeout.
async fn handle_ws(socket: WebSocket, ctx: ApiContext, account_id: Uuid, scope: Scope) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let mut events = ctx.state.hub.subscribe();

    let welcome = WsOutgoing::Welcome { account_id };
    if send_json(&mut ws_sink, &welcome).await.is_err() {
        return;
    }

    let mut session = WsSessionState::new();
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // Consume initial immediate tick

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if !event.visible_to(&scope) {
                            continue;
                        }
                        if send_json(&mut ws_sink, &WsOutgoing::Change(event)).await.is_err() {
                            break;
                        }
                    }
                    // Lagged subscribers just miss events; clients reload on reconnect
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(account_id = %account_id, skipped, "ws subscriber lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(ref text))) => {
                        if let Ok(WsIncoming::Pong {}) = serde_json::from_str::<WsIncoming>(text) {
                            session.on_pong();
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {} // Ping/Pong frames handled by the transport
                }
            }
            _ = heartbeat.tick() => {
                match session.on_heartbeat_tick() {
                    HeartbeatAction::HeartbeatTimeout => {
                        tracing::debug!(account_id = %account_id, "ws heartbeat timeout");
                        break;
                    }
                    HeartbeatAction::SendHeartbeat => {
                        if send_json(&mut ws_sink, &WsOutgoing::Heartbeat).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    let _ = ws_sink.close().await;
    tracing::info!(account_id = %account_id, "WebSocket disconnected");
}

async fn send_json<S>(sink: &mut S, msg: &WsOutgoing) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sink.send(Message::Text(json)).await.map_err(|_| ())
}
