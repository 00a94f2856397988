//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable so the engine and the frontend can evolve independently.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::domain::SolvedCategory;
use crate::engine::PuzzleEngine;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Load {
        #[serde(rename = "puzzleId")]
        puzzle_id: String,
    },
    SelectWord {
        word: String,
    },
    UnselectWord {
        word: String,
    },
    ClearSelection,
    Submit,
    Hint,
    RevealSolution,
    State,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    State {
        state: EngineSnapshot,
    },
    SubmitResult {
        success: bool,
        state: EngineSnapshot,
    },
    Error {
        message: String,
    },
}

/// Read model of one engine, as delivered to a presentation layer.
///
/// Unsolved categories are deliberately absent: only solved ones and the
/// remaining shuffled words leave the server.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub puzzle_id: Option<String>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub words: Vec<String>,
    pub selected_words: Vec<String>,
    pub solved_categories: Vec<SolvedCategory>,
    pub incorrect_guesses: u32,
    pub is_one_away: bool,
    pub hints: Vec<String>,
    pub hints_received: usize,
    pub categories_count: usize,
    pub is_hint_available: bool,
    pub is_reveal_solution_available: bool,
    pub is_complete: bool,
}

/// Convert the engine state to the public snapshot.
pub fn to_snapshot<G: RngCore + CryptoRng>(engine: &PuzzleEngine<G>) -> EngineSnapshot {
    EngineSnapshot {
        puzzle_id: engine.puzzle_id().map(str::to_string),
        is_loading: engine.is_loading(),
        error_message: engine.error_message().map(str::to_string),
        words: engine.words().to_vec(),
        selected_words: engine.selected_words().to_vec(),
        solved_categories: engine.solved_categories().to_vec(),
        incorrect_guesses: engine.incorrect_guesses(),
        is_one_away: engine.is_one_away(),
        hints: engine.hints().into_iter().map(str::to_string).collect(),
        hints_received: engine.hints_received(),
        categories_count: engine.categories_count(),
        is_hint_available: engine.is_hint_available(),
        is_reveal_solution_available: engine.is_reveal_solution_available(),
        is_complete: engine.is_complete(),
    }
}

//
// HTTP response DTOs
//

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameIdsOut {
    pub game_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
