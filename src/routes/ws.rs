//! WebSocket upgrade + message loop. Each connection owns one puzzle session.
//! Client messages are parsed as JSON and run against the session; every
//! message gets exactly one reply. A finished background load pushes a `state`
//! message on its own.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};
use uuid::Uuid;

use crate::logic::{handle_event, SessionEvent};
use crate::repository::GameRepository;
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade<R: GameRepository>(ws: WebSocketUpgrade, State(state): State<Arc<AppState<R>>>) -> impl IntoResponse {
  info!(target: "connections_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state), fields(session_id = %Uuid::new_v4()))]
async fn handle_ws<R: GameRepository>(mut socket: WebSocket, state: Arc<AppState<R>>) {
  info!(target: "connections_backend", "WebSocket connected");
  let mut session = state.new_session();

  loop {
    let event = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => SessionEvent::Text(txt),
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          continue;
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Ok(_)) => continue,
        Some(Err(e)) => {
          error!(target: "connections_backend", error = %e, "WS receive error");
          break;
        }
      },
      Some(done) = session.next_completion() => SessionEvent::Loaded(done),
    };

    let Some(reply) = handle_event(&mut session, event) else {
      debug!(target: "connections_backend", "Stale load completion dropped");
      continue;
    };

    let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });

    if let Err(e) = socket.send(Message::Text(out)).await {
      error!(target: "connections_backend", error = %e, "WS send error");
      break;
    }
  }
  info!(target: "connections_backend", "WebSocket disconnected");
}
