//! Game repository: where puzzle data and the list of puzzle ids come from.
//!
//! The engine only sees the [`GameRepository`] trait. [`HttpGameRepository`]
//! talks to the Connections API:
//!   GET {base}/games/{id}  200 => puzzle JSON, 202 => still generating
//!   GET {base}/games       200 => { "gameIds": [...] }
//!
//! Calls are instrumented with the puzzle id, status and latency (never the words).

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{StatusCode, Url};
use tracing::{debug, error, info, instrument};

use crate::domain::{FetchedGame, GameIds, PuzzleData};

/// Failures of a single repository request.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum RepositoryError {
  #[display("transport error: {_0}")]
  Transport(#[error(not(source))] String),
  #[display("unexpected HTTP status {status}")]
  Status { status: u16 },
  #[display("invalid response body: {_0}")]
  Decode(#[error(not(source))] String),
  #[display("invalid puzzle id {_0:?}")]
  InvalidPuzzleId(#[error(not(source))] String),
}

/// Source of puzzle data for the engine and of puzzle ids for the catalog.
pub trait GameRepository: Send + Sync + 'static {
  /// Fetch one puzzle. `is_generating` in the reply means "ask again later".
  fn fetch_game(&self, puzzle_id: &str) -> impl Future<Output = Result<FetchedGame, RepositoryError>> + Send;

  /// Fetch the selectable puzzle ids.
  fn fetch_game_ids(&self) -> impl Future<Output = Result<GameIds, RepositoryError>> + Send;
}

#[derive(Clone)]
pub struct HttpGameRepository {
  client: reqwest::Client,
  base_url: Url,
}

impl HttpGameRepository {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RepositoryError> {
    let base_url = Url::parse(base_url).map_err(|e| RepositoryError::Transport(format!("bad base url: {e}")))?;
    if base_url.cannot_be_a_base() {
      return Err(RepositoryError::Transport(format!("bad base url: {base_url}")));
    }
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| RepositoryError::Transport(e.to_string()))?;
    Ok(Self { client, base_url })
  }

  pub fn base_url(&self) -> &str {
    self.base_url.as_str()
  }

  /// `{base}/{segments..}`. Every segment is percent-encoded as a single path
  /// segment, so `/`, `?` and `#` inside a puzzle id stay inside it.
  fn url_for(&self, segments: &[&str]) -> Result<Url, RepositoryError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| RepositoryError::Transport(format!("bad base url: {}", self.base_url)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn get(&self, url: Url) -> Result<reqwest::Response, RepositoryError> {
    self.client
      .get(url)
      .header(USER_AGENT, "connections-backend/0.1")
      .header(ACCEPT, "application/json")
      .send()
      .await
      .map_err(|e| RepositoryError::Transport(e.to_string()))
  }
}

/// Ids the URL layer would drop or collapse (`.`/`..` segments are resolved
/// away, an empty one would hit the catalog route).
fn check_puzzle_id(puzzle_id: &str) -> Result<(), RepositoryError> {
  match puzzle_id {
    "" | "." | ".." => Err(RepositoryError::InvalidPuzzleId(puzzle_id.to_string())),
    _ => Ok(()),
  }
}

impl GameRepository for HttpGameRepository {
  #[instrument(level = "info", target = "repository", skip(self), fields(%puzzle_id))]
  async fn fetch_game(&self, puzzle_id: &str) -> Result<FetchedGame, RepositoryError> {
    let start = Instant::now();
    check_puzzle_id(puzzle_id)?;
    let url = self.url_for(&["games", puzzle_id])?;
    let res = match self.get(url).await {
      Ok(r) => r,
      Err(e) => {
        error!(target: "repository", %puzzle_id, elapsed = ?start.elapsed(), error = %e, "Game request failed");
        return Err(e);
      }
    };

    let status = res.status();
    if status == StatusCode::ACCEPTED {
      info!(target: "repository", %puzzle_id, elapsed = ?start.elapsed(), "Game still generating");
      return Ok(FetchedGame::generating());
    }
    if !status.is_success() {
      error!(target: "repository", %puzzle_id, status = status.as_u16(), "Game request rejected");
      return Err(RepositoryError::Status { status: status.as_u16() });
    }

    let data: PuzzleData = res.json().await.map_err(|e| RepositoryError::Decode(e.to_string()))?;
    if data.is_empty() {
      error!(target: "repository", %puzzle_id, "Game body has no categories");
      return Err(RepositoryError::Decode("puzzle has no categories".into()));
    }
    debug!(target: "repository", %puzzle_id, categories = data.len(), elapsed = ?start.elapsed(), "Game received");
    Ok(FetchedGame::ready(data))
  }

  #[instrument(level = "info", target = "repository", skip(self))]
  async fn fetch_game_ids(&self) -> Result<GameIds, RepositoryError> {
    let res = self.get(self.url_for(&["games"])?).await?;
    let status = res.status();
    if !status.is_success() {
      error!(target: "repository", status = status.as_u16(), "Game id request rejected");
      return Err(RepositoryError::Status { status: status.as_u16() });
    }
    let ids: GameIds = res.json().await.map_err(|e| RepositoryError::Decode(e.to_string()))?;
    debug!(target: "repository", count = ids.game_ids.len(), "Game ids received");
    Ok(ids)
  }
}

#[cfg(test)]
pub(crate) mod testing {
  //! Scripted in-memory repository for engine, session and route tests.

  use std::collections::{HashMap, VecDeque};
  use std::sync::Mutex;

  use super::*;
  use crate::domain::Category;

  /// Replies are consumed front to back per puzzle id; the last reply repeats.
  #[derive(Default)]
  pub struct ScriptedRepository {
    replies: Mutex<HashMap<String, VecDeque<Result<FetchedGame, RepositoryError>>>>,
    calls: Mutex<Vec<String>>,
    ids: Mutex<Option<Result<GameIds, RepositoryError>>>,
  }

  impl ScriptedRepository {
    pub fn new() -> Self {
      Self::default()
    }

    pub fn with_game(self, puzzle_id: &str, reply: Result<FetchedGame, RepositoryError>) -> Self {
      self.push(puzzle_id, reply);
      self
    }

    pub fn with_ids(self, ids: Result<GameIds, RepositoryError>) -> Self {
      *self.ids.lock().unwrap() = Some(ids);
      self
    }

    pub fn push(&self, puzzle_id: &str, reply: Result<FetchedGame, RepositoryError>) {
      self.replies.lock().unwrap().entry(puzzle_id.to_string()).or_default().push_back(reply);
    }

    pub fn calls_for(&self, puzzle_id: &str) -> usize {
      self.calls.lock().unwrap().iter().filter(|c| *c == puzzle_id).count()
    }
  }

  impl GameRepository for ScriptedRepository {
    async fn fetch_game(&self, puzzle_id: &str) -> Result<FetchedGame, RepositoryError> {
      self.calls.lock().unwrap().push(puzzle_id.to_string());
      let mut replies = self.replies.lock().unwrap();
      let queue = replies.get_mut(puzzle_id).ok_or(RepositoryError::Status { status: 404 })?;
      if queue.len() > 1 {
        queue.pop_front().unwrap_or(Err(RepositoryError::Status { status: 404 }))
      } else {
        queue.front().cloned().unwrap_or(Err(RepositoryError::Status { status: 404 }))
      }
    }

    async fn fetch_game_ids(&self) -> Result<GameIds, RepositoryError> {
      self.ids.lock().unwrap().clone().unwrap_or_else(|| Ok(GameIds::default()))
    }
  }

  pub fn category(words: &[&str], hint: Option<&str>) -> Category {
    Category {
      words: words.iter().map(|w| w.to_string()).collect(),
      hint: hint.map(str::to_string),
    }
  }

  /// Four categories of four words, WORD01..WORD16, each with a hint.
  pub fn sample_puzzle() -> PuzzleData {
    let mut data = PuzzleData::default();
    for c in 0..4 {
      let words: Vec<String> = (1..=4).map(|w| format!("WORD{:02}", c * 4 + w)).collect();
      let refs: Vec<&str> = words.iter().map(String::as_str).collect();
      data.categories.insert(
        format!("Category {}", c + 1),
        category(&refs, Some(&format!("Hint {}", c + 1))),
      );
    }
    data
  }
}
