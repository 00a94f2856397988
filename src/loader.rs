//! Fetching a puzzle until the repository has it ready.
//!
//! The repository may answer "still generating"; in that case we wait a fixed
//! interval and ask again. The chain lives entirely inside one future, so
//! dropping or aborting that future also cancels its pending timer.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::domain::PuzzleData;
use crate::repository::{GameRepository, RepositoryError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Why a load did not produce puzzle data.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum LoadError {
  #[display("repository request failed: {_0}")]
  Repository(#[from] RepositoryError),
  #[display("game still generating after {attempts} attempts")]
  StillGenerating { attempts: u32 },
}

impl LoadError {
  /// Message shown to the player.
  pub fn user_message(&self) -> &'static str {
    match self {
      LoadError::Repository(_) => "Failed to load game",
      LoadError::StillGenerating { .. } => "Game is still being generated, try again later",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollPolicy {
  pub interval: Duration,
  /// `None` polls until the game is ready.
  pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
  fn default() -> Self {
    Self { interval: DEFAULT_POLL_INTERVAL, max_attempts: None }
  }
}

/// Fetch `puzzle_id`, re-polling while the repository reports it as generating.
/// Repository errors end the chain immediately.
#[instrument(level = "info", target = "puzzle", skip(repo, policy), fields(%puzzle_id))]
pub async fn fetch_until_ready<R>(repo: &R, puzzle_id: &str, policy: &PollPolicy) -> Result<PuzzleData, LoadError>
where
  R: GameRepository,
{
  let mut attempts = 0u32;
  loop {
    attempts += 1;
    let game = repo.fetch_game(puzzle_id).await?;
    if !game.is_generating {
      info!(target: "puzzle", %puzzle_id, attempts, categories = game.data.len(), "Puzzle data ready");
      return Ok(game.data);
    }

    if policy.max_attempts.is_some_and(|max| attempts >= max) {
      warn!(target: "puzzle", %puzzle_id, attempts, "Giving up polling for puzzle");
      return Err(LoadError::StillGenerating { attempts });
    }

    debug!(target: "puzzle", %puzzle_id, attempts, interval = ?policy.interval, "Puzzle still generating; polling again");
    tokio::time::sleep(policy.interval).await;
  }
}
