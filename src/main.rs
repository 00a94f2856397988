//! Connections · puzzle engine backend
//!
//! - Puzzle engine: selection, guesses, one-away feedback, hints, reveal
//! - Axum WebSocket API, one engine session per connection
//! - HTTP game catalog, static frontend fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                     : u16 (default 3000)
//!   CONNECTIONS_API_BASE_URL : upstream games API (default "http://localhost:8080")
//!   CONNECTIONS_CONFIG_PATH  : path to TOML config (timeouts, polling, reveal policy)
//!   LOG_LEVEL                : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT               : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod repository;
mod loader;
mod engine;
mod session;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{future::Future, net::SocketAddr, sync::Arc};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = config::load_config();
  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

  // Shared state holds only config + repository; puzzle state is per connection.
  let state = Arc::new(AppState::from_config(config)?);

  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "connections_backend", %addr, "HTTP server listening");
  serve_until(listener, app, shutdown_signal()).await?;
  Ok(())
}

/// Serve until `shutdown` resolves, then let in-flight requests finish.
async fn serve_until<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
  F: Future<Output = ()> + Send + 'static,
{
  axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
  info!(target: "connections_backend", "HTTP server stopped");
  Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      error!(target: "connections_backend", error = %e, "Failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        error!(target: "connections_backend", error = %e, "Failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };
  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  info!(target: "connections_backend", "Shutdown signal received, draining connections");
}
