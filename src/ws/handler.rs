//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::{KeepAlive, run_session};
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to a realtime session.
///
/// The session is registered with the fanout only once the handshake has
/// completed.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let fanout = state.fanout.clone();
    let keepalive = KeepAlive::new(state.config.ping_interval, state.config.idle_timeout);

    ws.on_upgrade(move |socket| run_session(socket, fanout, keepalive))
}
