//! The puzzle engine: per-puzzle state plus the selection, submission, hint and
//! reveal rules.
//!
//! All commands are synchronous and apply their state change before returning.
//! Loading is split in two halves so the host can run the fetch elsewhere:
//! [`PuzzleEngine::begin_load`] resets state and hands out a [`LoadTicket`],
//! [`PuzzleEngine::finish_load`] applies the outcome only if that ticket is
//! still the current one. A newer `begin_load` therefore always wins over a
//! slower, older fetch.

use rand::{rngs::OsRng, CryptoRng, RngCore};
use tracing::{debug, info, instrument, warn};

use crate::domain::{PuzzleData, SolvedCategory};
use crate::loader::LoadError;
use crate::util::{random_index, shuffle_in_place};

/// Most words a player may have selected at once; also the size of a guess.
pub const MAX_SELECTED_WORDS: usize = 4;

/// When the give-up action is offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPolicy {
  /// Whenever the puzzle is loaded and incomplete.
  Always,
  /// Only after this many incorrect guesses, and while incomplete.
  AfterIncorrectGuesses(u32),
}

/// Proof of which load a completion belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
  epoch: u64,
  puzzle_id: String,
}

impl LoadTicket {
  pub fn puzzle_id(&self) -> &str {
    &self.puzzle_id
  }
}

/// Everything that belongs to one puzzle id. Replaced wholesale on load.
#[derive(Clone, Debug, Default)]
struct EngineState {
  puzzle_id: Option<String>,
  categories: PuzzleData,
  words: Vec<String>,
  selected_words: Vec<String>,
  solved_categories: Vec<SolvedCategory>,
  incorrect_guesses: u32,
  is_one_away: bool,
  // description -> hint, in the order they were revealed
  revealed_hints: Vec<(String, String)>,
  is_loading: bool,
  error_message: Option<String>,
}

pub struct PuzzleEngine<G = OsRng> {
  rng: G,
  reveal_policy: RevealPolicy,
  epoch: u64,
  state: EngineState,
}

impl PuzzleEngine<OsRng> {
  pub fn new(reveal_policy: RevealPolicy) -> Self {
    Self::with_rng(OsRng, reveal_policy)
  }
}

impl<G: RngCore + CryptoRng> PuzzleEngine<G> {
  /// Engine drawing shuffle order and hint picks from `rng`.
  pub fn with_rng(rng: G, reveal_policy: RevealPolicy) -> Self {
    Self { rng, reveal_policy, epoch: 0, state: EngineState::default() }
  }

  // --- Loading ---

  /// Drop all state of the previous puzzle and enter the loading state.
  #[instrument(level = "info", target = "puzzle", skip(self), fields(%puzzle_id))]
  pub fn begin_load(&mut self, puzzle_id: &str) -> LoadTicket {
    self.epoch += 1;
    self.state = EngineState {
      puzzle_id: Some(puzzle_id.to_string()),
      is_loading: true,
      ..EngineState::default()
    };
    debug!(target: "puzzle", %puzzle_id, epoch = self.epoch, "Load started");
    LoadTicket { epoch: self.epoch, puzzle_id: puzzle_id.to_string() }
  }

  /// Apply a fetch outcome. Returns `false` (and changes nothing) for a stale ticket.
  #[instrument(level = "info", target = "puzzle", skip(self, outcome), fields(puzzle_id = %ticket.puzzle_id, epoch = ticket.epoch))]
  pub fn finish_load(&mut self, ticket: &LoadTicket, outcome: Result<PuzzleData, LoadError>) -> bool {
    if ticket.epoch != self.epoch {
      debug!(target: "puzzle", puzzle_id = %ticket.puzzle_id, current_epoch = self.epoch, "Discarding stale load result");
      return false;
    }

    match outcome {
      Ok(data) => {
        let mut words = data.all_words();
        shuffle_in_place(&mut self.rng, &mut words);
        info!(target: "puzzle", puzzle_id = %ticket.puzzle_id, categories = data.len(), words = words.len(), "Puzzle loaded");
        self.state.categories = data;
        self.state.words = words;
      }
      Err(e) => {
        warn!(target: "puzzle", puzzle_id = %ticket.puzzle_id, error = %e, "Puzzle load failed");
        self.state.error_message = Some(e.user_message().to_string());
      }
    }
    self.state.is_loading = false;
    true
  }

  // --- Selection ---

  /// Add `word` to the selection. Ignored when four are already selected, when
  /// the word is already selected, or when it is not on the board.
  pub fn select_word(&mut self, word: &str) {
    let s = &mut self.state;
    if s.selected_words.len() >= MAX_SELECTED_WORDS
      || s.selected_words.iter().any(|w| w == word)
      || !s.words.iter().any(|w| w == word)
    {
      return;
    }
    s.selected_words.push(word.to_string());
    s.is_one_away = false;
  }

  pub fn unselect_word(&mut self, word: &str) {
    self.state.selected_words.retain(|w| w != word);
    self.state.is_one_away = false;
  }

  pub fn clear_selected_words(&mut self) {
    self.state.selected_words.clear();
    self.state.is_one_away = false;
  }

  // --- Guessing ---

  /// Submit the current selection as a guess.
  ///
  /// Anything but exactly four selected words is ignored and returns `false`.
  /// A correct guess solves its category and clears the selection; a wrong one
  /// counts as an incorrect guess, keeps the selection and sets the one-away
  /// flag when three of the four words share a category.
  #[instrument(level = "debug", target = "puzzle", skip(self), fields(puzzle_id = ?self.state.puzzle_id))]
  pub fn submit_words(&mut self) -> bool {
    let s = &mut self.state;
    if s.selected_words.len() != MAX_SELECTED_WORDS {
      return false;
    }

    let matched = s
      .categories
      .categories
      .iter()
      .find(|(_, category)| s.selected_words.iter().all(|w| category.contains(w)));

    if let Some((description, category)) = matched {
      let solved = SolvedCategory::from_category(description, category);
      s.words.retain(|w| !category.contains(w));
      s.revealed_hints.retain(|(d, _)| d != description);
      s.selected_words.clear();
      s.is_one_away = false;
      debug!(target: "puzzle", solved = s.solved_categories.len() + 1, "Category solved");
      s.solved_categories.push(solved);
      return true;
    }

    s.is_one_away = s.categories.categories.values().any(|category| {
      s.selected_words.iter().filter(|w| category.contains(w)).count() == MAX_SELECTED_WORDS - 1
    });
    s.incorrect_guesses += 1;
    debug!(target: "puzzle", incorrect_guesses = s.incorrect_guesses, one_away = s.is_one_away, "Incorrect guess");
    false
  }

  // --- Hints ---

  /// Reveal the hint of one random category that is neither solved nor hinted.
  pub fn get_hint(&mut self) {
    let s = &self.state;
    let eligible: Vec<&String> = s
      .categories
      .categories
      .keys()
      .filter(|d| !s.is_solved(d) && !s.revealed_hints.iter().any(|(h, _)| h == *d))
      .collect();

    let Some(i) = random_index(&mut self.rng, eligible.len()) else {
      return;
    };
    let description = eligible[i].clone();
    let hint = self.state.categories.categories[&description].hint.clone().unwrap_or_default();
    debug!(target: "puzzle", hints = self.state.revealed_hints.len() + 1, "Hint revealed");
    self.state.revealed_hints.push((description, hint));
  }

  // --- Giving up ---

  /// Solve every remaining category at once.
  pub fn reveal_solution(&mut self) {
    let s = &mut self.state;
    let remaining: Vec<SolvedCategory> = s
      .categories
      .categories
      .iter()
      .filter(|(d, _)| !s.is_solved(d))
      .map(|(d, c)| SolvedCategory::from_category(d, c))
      .collect();
    if !remaining.is_empty() {
      info!(target: "puzzle", puzzle_id = ?s.puzzle_id, revealed = remaining.len(), "Solution revealed");
    }
    s.solved_categories.extend(remaining);
    s.words.clear();
    s.selected_words.clear();
    s.revealed_hints.clear();
    s.is_one_away = false;
  }

  // --- Queries ---

  pub fn puzzle_id(&self) -> Option<&str> {
    self.state.puzzle_id.as_deref()
  }

  pub fn words(&self) -> &[String] {
    &self.state.words
  }

  pub fn selected_words(&self) -> &[String] {
    &self.state.selected_words
  }

  pub fn solved_categories(&self) -> &[SolvedCategory] {
    &self.state.solved_categories
  }

  pub fn incorrect_guesses(&self) -> u32 {
    self.state.incorrect_guesses
  }

  pub fn is_one_away(&self) -> bool {
    self.state.is_one_away
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading
  }

  pub fn error_message(&self) -> Option<&str> {
    self.state.error_message.as_deref()
  }

  /// Revealed hint texts, oldest first.
  pub fn hints(&self) -> Vec<&str> {
    self.state.revealed_hints.iter().map(|(_, h)| h.as_str()).collect()
  }

  pub fn hints_received(&self) -> usize {
    self.state.revealed_hints.len()
  }

  pub fn categories_count(&self) -> usize {
    self.state.categories.len()
  }

  pub fn is_hint_available(&self) -> bool {
    self.categories_count() > self.state.solved_categories.len() + self.state.revealed_hints.len()
  }

  pub fn is_reveal_solution_available(&self) -> bool {
    let incomplete = self.state.solved_categories.len() < self.categories_count();
    match self.reveal_policy {
      RevealPolicy::Always => incomplete,
      RevealPolicy::AfterIncorrectGuesses(n) => incomplete && self.state.incorrect_guesses >= n,
    }
  }

  /// Loaded and every category solved.
  pub fn is_complete(&self) -> bool {
    self.categories_count() > 0 && self.state.solved_categories.len() == self.categories_count()
  }
}

impl EngineState {
  fn is_solved(&self, description: &str) -> bool {
    self.solved_categories.iter().any(|s| s.description == description)
  }
}
