//! Application state shared by all handlers: configuration and the game repository.
//!
//! Puzzle state is not shared. Each WebSocket connection gets its own
//! `PuzzleSession` from [`AppState::new_session`].

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::ServiceConfig;
use crate::engine::PuzzleEngine;
use crate::repository::{GameRepository, HttpGameRepository, RepositoryError};
use crate::session::PuzzleSession;

pub struct AppState<R> {
    pub config: ServiceConfig,
    pub repository: Arc<R>,
}

impl AppState<HttpGameRepository> {
    /// Build state backed by the HTTP repository described in `config`.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(config: ServiceConfig) -> Result<Self, RepositoryError> {
        let repository = HttpGameRepository::new(&config.api_base_url, config.request_timeout())?;
        info!(
            target: "connections_backend",
            base_url = %repository.base_url(),
            timeout = ?config.request_timeout(),
            poll = ?config.poll_policy(),
            reveal = ?config.reveal_policy(),
            "Game repository configured"
        );
        Ok(Self::new(config, Arc::new(repository)))
    }
}

impl<R: GameRepository> AppState<R> {
    pub fn new(config: ServiceConfig, repository: Arc<R>) -> Self {
        Self { config, repository }
    }

    /// Fresh session with an OS-backed random source and the configured policies.
    pub fn new_session(&self) -> PuzzleSession<R> {
        PuzzleSession::new(
            Arc::clone(&self.repository),
            self.config.poll_policy(),
            PuzzleEngine::new(self.config.reveal_policy()),
        )
    }
}
