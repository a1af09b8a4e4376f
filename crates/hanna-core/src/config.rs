//! Tunables for the search service.

use serde::{Deserialize, Serialize};

/// Search settings. Every field has a default, so an empty `[search]` table
/// (or none at all) is valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  /// Candidate cap applied before clustering when a request has no `limit`.
  pub result_limit:              usize,
  /// Zoom levels strictly above this are served as raw geometries.
  pub clustering_zoom_threshold: f64,
  /// Shortest term the default tokenizer keeps.
  pub min_term_length:           usize,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      result_limit:              500,
      clustering_zoom_threshold: 10.0,
      min_term_length:           1,
    }
  }
}
