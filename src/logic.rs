//! Core behaviors shared by the HTTP and WebSocket handlers.
//!
//! This includes:
//!   - The game catalog (selectable puzzle ids)
//!   - Dispatching one client command to a puzzle session
//!   - Answering the events of a WebSocket connection (frames and finished loads)

use rand::{CryptoRng, RngCore};
use tracing::{debug, instrument};

use crate::protocol::{to_snapshot, ClientWsMessage, ServerWsMessage};
use crate::repository::{GameRepository, RepositoryError};
use crate::session::{LoadCompletion, PuzzleSession};

/// Puzzle ids offered for selection, newest first, without duplicates.
/// Ids are calendar dates (`YYYY-MM-DD`), so reverse lexical order is newest first.
#[instrument(level = "info", skip(repo))]
pub async fn list_game_ids<R: GameRepository>(repo: &R) -> Result<Vec<String>, RepositoryError> {
  let mut ids = repo.fetch_game_ids().await?.game_ids;
  ids.sort_unstable_by(|a, b| b.cmp(a));
  ids.dedup();
  debug!(target: "connections_backend", count = ids.len(), "Game catalog listed");
  Ok(ids)
}

/// Run one command against the session and build the reply.
///
/// Misuse (short submit, fifth word, ...) is not an error: the command is a
/// no-op and the client simply receives the unchanged state.
pub fn apply_command<R, G>(session: &mut PuzzleSession<R, G>, msg: ClientWsMessage) -> ServerWsMessage
where
  R: GameRepository,
  G: RngCore + CryptoRng,
{
  match msg {
    ClientWsMessage::Ping => return ServerWsMessage::Pong,
    ClientWsMessage::Load { puzzle_id } => session.load(&puzzle_id),
    ClientWsMessage::SelectWord { word } => session.engine_mut().select_word(&word),
    ClientWsMessage::UnselectWord { word } => session.engine_mut().unselect_word(&word),
    ClientWsMessage::ClearSelection => session.engine_mut().clear_selected_words(),
    ClientWsMessage::Submit => {
      let success = session.engine_mut().submit_words();
      return ServerWsMessage::SubmitResult { success, state: to_snapshot(session.engine()) };
    }
    ClientWsMessage::Hint => session.engine_mut().get_hint(),
    ClientWsMessage::RevealSolution => session.engine_mut().reveal_solution(),
    ClientWsMessage::State => {}
  }
  ServerWsMessage::State { state: to_snapshot(session.engine()) }
}

/// What a connection loop wakes up for.
#[derive(Debug)]
pub enum SessionEvent {
  /// A text frame from the client (expected to be a JSON command).
  Text(String),
  /// A background load finished.
  Loaded(LoadCompletion),
}

/// The message to send back for one event, or `None` when a load completion
/// arrived for a load that was already replaced.
pub fn handle_event<R, G>(session: &mut PuzzleSession<R, G>, event: SessionEvent) -> Option<ServerWsMessage>
where
  R: GameRepository,
  G: RngCore + CryptoRng,
{
  match event {
    SessionEvent::Text(txt) => Some(match serde_json::from_str::<ClientWsMessage>(&txt) {
      Ok(msg) => {
        debug!(target: "connections_backend", "WS received: {:?}", &msg);
        apply_command(session, msg)
      }
      Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
    }),
    SessionEvent::Loaded(done) => {
      if !session.apply(done) {
        return None;
      }
      Some(ServerWsMessage::State { state: to_snapshot(session.engine()) })
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::domain::{FetchedGame, GameIds};
  use crate::engine::{PuzzleEngine, RevealPolicy};
  use crate::loader::PollPolicy;
  use crate::domain::PuzzleData;
  use crate::repository::testing::{category, sample_puzzle, ScriptedRepository};
  use rand::{rngs::StdRng, SeedableRng};

  fn ids(list: &[&str]) -> GameIds {
    GameIds { game_ids: list.iter().map(|s| s.to_string()).collect() }
  }

  #[tokio::test]
  async fn catalog_is_newest_first_and_unique() {
    let repo = ScriptedRepository::new().with_ids(Ok(ids(&["2024-01-14", "2024-01-16", "2024-01-15", "2024-01-16"])));
    let list = list_game_ids(&repo).await.unwrap();
    assert_eq!(list, ["2024-01-16", "2024-01-15", "2024-01-14"]);
  }

  #[tokio::test]
  async fn catalog_propagates_errors() {
    let repo = ScriptedRepository::new().with_ids(Err(RepositoryError::Status { status: 502 }));
    assert_eq!(list_game_ids(&repo).await.unwrap_err(), RepositoryError::Status { status: 502 });
  }

  #[tokio::test]
  async fn commands_drive_the_session() {
    let repo = Arc::new(ScriptedRepository::new().with_game("2024-01-15", Ok(FetchedGame::ready(sample_puzzle()))));
    let engine = PuzzleEngine::with_rng(StdRng::seed_from_u64(11), RevealPolicy::Always);
    let mut session = PuzzleSession::new(repo, PollPolicy::default(), engine);

    match apply_command(&mut session, ClientWsMessage::Load { puzzle_id: "2024-01-15".into() }) {
      ServerWsMessage::State { state } => assert!(state.is_loading),
      other => panic!("unexpected reply: {other:?}"),
    }
    let done = session.next_completion().await.unwrap();
    assert!(session.apply(done));

    for w in ["WORD01", "WORD02", "WORD03", "WORD04"] {
      apply_command(&mut session, ClientWsMessage::SelectWord { word: w.into() });
    }
    match apply_command(&mut session, ClientWsMessage::Submit) {
      ServerWsMessage::SubmitResult { success, state } => {
        assert!(success);
        assert_eq!(state.solved_categories.len(), 1);
        assert_eq!(state.words.len(), 12);
      }
      other => panic!("unexpected reply: {other:?}"),
    }

    match apply_command(&mut session, ClientWsMessage::Submit) {
      ServerWsMessage::SubmitResult { success, state } => {
        assert!(!success);
        assert_eq!(state.incorrect_guesses, 0);
      }
      other => panic!("unexpected reply: {other:?}"),
    }

    apply_command(&mut session, ClientWsMessage::Hint);
    match apply_command(&mut session, ClientWsMessage::RevealSolution) {
      ServerWsMessage::State { state } => {
        assert!(state.is_complete);
        assert!(state.hints.is_empty());
        assert_eq!(state.solved_categories.len(), 4);
      }
      other => panic!("unexpected reply: {other:?}"),
    }

    assert!(matches!(apply_command(&mut session, ClientWsMessage::Ping), ServerWsMessage::Pong));
  }

  fn state_of(reply: Option<ServerWsMessage>) -> crate::protocol::EngineSnapshot {
    match reply {
      Some(ServerWsMessage::State { state }) => state,
      other => panic!("expected a state message, got {other:?}"),
    }
  }

  #[tokio::test(start_paused = true)]
  async fn connection_events_push_loaded_state_and_drop_stale_loads() {
    let mut small = PuzzleData::default();
    small.categories.insert("B1".into(), category(&["P", "Q", "R", "S"], None));
    let repo = Arc::new(
      ScriptedRepository::new()
        .with_game("2024-01-15", Ok(FetchedGame::ready(sample_puzzle())))
        .with_game("2024-01-16", Ok(FetchedGame::generating()))
        .with_game("2024-01-16", Ok(FetchedGame::ready(small))),
    );
    let engine = PuzzleEngine::with_rng(StdRng::seed_from_u64(3), RevealPolicy::Always);
    let mut session = PuzzleSession::new(repo, PollPolicy::default(), engine);

    let state = state_of(handle_event(&mut session, SessionEvent::Text(r#"{"type":"load","puzzleId":"2024-01-15"}"#.into())));
    assert!(state.is_loading);
    assert_eq!(state.puzzle_id.as_deref(), Some("2024-01-15"));
    let stale = session.next_completion().await.unwrap();

    let state = state_of(handle_event(&mut session, SessionEvent::Text(r#"{"type":"load","puzzleId":"2024-01-16"}"#.into())));
    assert!(state.is_loading);
    assert!(handle_event(&mut session, SessionEvent::Loaded(stale)).is_none());

    // Arrives after one poll interval on the paused clock.
    let fresh = session.next_completion().await.unwrap();
    let state = state_of(handle_event(&mut session, SessionEvent::Loaded(fresh)));
    assert!(!state.is_loading);
    assert_eq!(state.puzzle_id.as_deref(), Some("2024-01-16"));
    assert_eq!(state.words.len(), 4);
    assert_eq!(state.error_message, None);

    match handle_event(&mut session, SessionEvent::Text("not json".into())) {
      Some(ServerWsMessage::Error { message }) => assert!(message.starts_with("Invalid JSON"), "{message}"),
      other => panic!("unexpected reply: {other:?}"),
    }
  }
}
