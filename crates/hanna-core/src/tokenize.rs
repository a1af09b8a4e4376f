//! Tokenization for the full-text half of the text filter.
//!
//! The tokenizer is pluggable: language-specific stemming belongs in a
//! [`Tokenizer`] implementation, not in the filter.

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into normalised search terms.
pub trait Tokenizer: Send + Sync {
  fn tokens(&self, text: &str) -> Vec<String>;

  /// Query terms shorter than this many characters match whole document
  /// terms only; longer ones match as prefixes.
  fn min_prefix_length(&self) -> usize { 1 }
}

/// Lowercasing Unicode word splitter.
///
/// Every word is kept. Words shorter than `min_term_length` characters are
/// still searchable, but only as exact terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordTokenizer {
  pub min_term_length: usize,
}

impl Default for WordTokenizer {
  fn default() -> Self { Self { min_term_length: 1 } }
}

impl Tokenizer for WordTokenizer {
  fn tokens(&self, text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
  }

  fn min_prefix_length(&self) -> usize { self.min_term_length.max(1) }
}

/// Prefix-query match: every query term must be a prefix of some document
/// term, or equal to one when it is shorter than `min_prefix_length`
/// characters. An empty query matches nothing.
pub fn full_text_match(
  query_terms: &[String],
  document_terms: &[String],
  min_prefix_length: usize,
) -> bool {
  !query_terms.is_empty()
    && query_terms.iter().all(|q| {
      let as_prefix = q.chars().count() >= min_prefix_length;
      document_terms
        .iter()
        .any(|d| if as_prefix { d.starts_with(q.as_str()) } else { d == q })
    })
}
