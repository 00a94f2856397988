//! Domain models: categories, puzzle data as delivered by the repository, and
//! solved-category snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One hidden group of words. Its description is the key it is stored under
/// in [`PuzzleData::categories`]; there is no separate id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub words: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hint: Option<String>,
}

impl Category {
  pub fn contains(&self, word: &str) -> bool {
    self.words.iter().any(|w| w == word)
  }
}

/// Wire shape: `{ "categories": { "<description>": { "words": [..], "hint"?: ".." } } }`.
///
/// Categories are kept in description order so that reveal order and tests are
/// deterministic regardless of how the server ordered its JSON object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleData {
  pub categories: BTreeMap<String, Category>,
}

impl PuzzleData {
  /// All words of all categories, category by category.
  pub fn all_words(&self) -> Vec<String> {
    self.categories
      .values()
      .flat_map(|c| c.words.iter().cloned())
      .collect()
  }

  pub fn len(&self) -> usize {
    self.categories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.categories.is_empty()
  }
}

/// A category the player solved (or had revealed). Words are sorted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedCategory {
  pub description: String,
  pub words: Vec<String>,
}

impl SolvedCategory {
  pub fn from_category(description: &str, category: &Category) -> Self {
    let mut words = category.words.clone();
    words.sort();
    Self { description: description.to_string(), words }
  }
}

/// One reply of the repository for a puzzle id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchedGame {
  pub data: PuzzleData,
  /// The server accepted the request but the puzzle is not generated yet.
  pub is_generating: bool,
}

impl FetchedGame {
  pub fn ready(data: PuzzleData) -> Self {
    Self { data, is_generating: false }
  }

  pub fn generating() -> Self {
    Self { data: PuzzleData::default(), is_generating: true }
  }
}

/// Catalog listing as returned by `GET /games`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameIds {
  pub game_ids: Vec<String>,
}
