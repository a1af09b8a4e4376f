//! Error types for `hanna-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The request is malformed and was rejected before touching the store.
  #[error("invalid filter: {0}")]
  InvalidFilter(String),

  /// The store collaborator failed. No partial results are returned.
  #[error("query failed: {0}")]
  QueryFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn invalid(msg: impl Into<String>) -> Self { Self::InvalidFilter(msg.into()) }

  pub fn is_client_error(&self) -> bool { matches!(self, Self::InvalidFilter(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
