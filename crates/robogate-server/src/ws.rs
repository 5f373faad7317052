// crates/robogate-server/src/ws.rs
// ============================================================================
// Module: Run WebSocket Stream
// Description: `GET /ws/runs/{run_id}` — forwards a run's broadcast-hub
//              messages to the client as `{kind, data}` JSON frames.
// Purpose: Give operators and the CLI a live view of telemetry, decisions,
//          alerts, status transitions, and agent reasoning (§4.6, §6).
// Dependencies: axum (ws feature), robogate-core, robogate-hub
// ============================================================================

//! ## Overview
//! Grounded on the upgrade-then-spawn-a-forwarding-task pattern used for the
//! terminal-streaming endpoint in the other example repos consulted for
//! this crate's axum layer: [`run_ws`] upgrades the connection, then
//! [`stream_run`] subscribes to the hub and forwards every [`HubMessage`]
//! until the subscriber is evicted, the run's control loop ends, or the
//! client disconnects.

use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::ws::Message;
use axum::extract::ws::WebSocket;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;
use robogate_core::HubMessage;
use robogate_core::RunId;
use serde::Deserialize;

use crate::state::AppState;

/// Query parameters for `GET /ws/runs/{run_id}`.
#[derive(Debug, Deserialize)]
pub struct RunWsQuery {
    /// When `true`, the stream stays open past a terminal status transition
    /// instead of closing (§6).
    #[serde(default)]
    pub keep_open_after_terminal: bool,
}

/// `GET /ws/runs/{run_id}`.
pub async fn run_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(query): Query<RunWsQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_run(socket, state, RunId::new(run_id), query.keep_open_after_terminal))
}

async fn stream_run(mut socket: WebSocket, state: AppState, run_id: RunId, keep_open_after_terminal: bool) {
    let (subscriber_id, mut receiver) = state.hub.subscribe(&run_id);
    loop {
        let Some(message) = receiver.recv().await else {
            let _ = socket.send(Message::Text("{\"kind\":\"closed\",\"data\":null}".into())).await;
            break;
        };
        let Ok(frame) = serde_json::to_string(&message) else {
            tracing::warn!(run_id = %run_id, "failed to serialize hub message, dropping frame");
            continue;
        };
        if socket.send(Message::Text(frame.into())).await.is_err() {
            break;
        }
        if !keep_open_after_terminal && matches!(message, HubMessage::Status(status) if status.is_terminal()) {
            break;
        }
    }
    state.hub.unsubscribe(&run_id, subscriber_id);
}
