//! One player's puzzle session: an engine plus the background load feeding it.
//!
//! The session is single-owner (one per WebSocket connection). Loads run on a
//! spawned task and report back through a channel; the owner applies the
//! result with [`PuzzleSession::apply`] between commands, so commands and load
//! completions never interleave.

use std::sync::Arc;

use rand::{rngs::OsRng, CryptoRng, RngCore};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::domain::PuzzleData;
use crate::engine::{LoadTicket, PuzzleEngine};
use crate::loader::{fetch_until_ready, LoadError, PollPolicy};
use crate::repository::GameRepository;

/// Result of a background load, tagged with the ticket it was started for.
#[derive(Debug)]
pub struct LoadCompletion {
  pub ticket: LoadTicket,
  pub outcome: Result<PuzzleData, LoadError>,
}

pub struct PuzzleSession<R, G = OsRng> {
  repo: Arc<R>,
  poll: PollPolicy,
  engine: PuzzleEngine<G>,
  task: Option<JoinHandle<()>>,
  tx: mpsc::UnboundedSender<LoadCompletion>,
  rx: mpsc::UnboundedReceiver<LoadCompletion>,
}

impl<R: GameRepository, G: RngCore + CryptoRng> PuzzleSession<R, G> {
  pub fn new(repo: Arc<R>, poll: PollPolicy, engine: PuzzleEngine<G>) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { repo, poll, engine, task: None, tx, rx }
  }

  pub fn engine(&self) -> &PuzzleEngine<G> {
    &self.engine
  }

  pub fn engine_mut(&mut self) -> &mut PuzzleEngine<G> {
    &mut self.engine
  }

  /// Start loading `puzzle_id`, abandoning any load still in flight.
  ///
  /// The engine is reset immediately. Aborting the old task also drops its
  /// pending poll timer; anything it already sent is rejected by the ticket.
  #[instrument(level = "info", target = "puzzle", skip(self), fields(%puzzle_id))]
  pub fn load(&mut self, puzzle_id: &str) {
    if let Some(task) = self.task.take() {
      task.abort();
      debug!(target: "puzzle", %puzzle_id, "Aborted previous load");
    }

    let ticket = self.engine.begin_load(puzzle_id);
    let repo = Arc::clone(&self.repo);
    let poll = self.poll.clone();
    let tx = self.tx.clone();
    self.task = Some(tokio::spawn(async move {
      let outcome = fetch_until_ready(repo.as_ref(), ticket.puzzle_id(), &poll).await;
      let _ = tx.send(LoadCompletion { ticket, outcome });
    }));
  }

  /// Wait for the next background load to finish.
  pub async fn next_completion(&mut self) -> Option<LoadCompletion> {
    self.rx.recv().await
  }

  /// Apply a completion to the engine. `false` when it was stale.
  pub fn apply(&mut self, completion: LoadCompletion) -> bool {
    let LoadCompletion { ticket, outcome } = completion;
    if self.engine.finish_load(&ticket, outcome) {
      self.task = None;
      true
    } else {
      false
    }
  }
}

impl<R, G> Drop for PuzzleSession<R, G> {
  fn drop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}
