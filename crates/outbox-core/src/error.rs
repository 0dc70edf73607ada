//! Error types for `outbox-core`.

use thiserror::Error;

use crate::submission::SubmissionId;

/// A failure reported by a [`SubmissionStore`](crate::store::SubmissionStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("submission not found: {0}")]
  NotFound(SubmissionId),

  /// The backend rejected a field value.
  #[error("validation failed: {0}")]
  Validation(String),

  /// The submission is no longer in a state that permits the operation.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("not authenticated")]
  Unauthorized,

  #[error("unexpected response {status}: {message}")]
  Http { status: u16, message: String },

  #[error("transport error: {0}")]
  Transport(String),

  #[error("could not decode response: {0}")]
  Decode(String),
}

impl Error {
  /// Whether retrying the same request later could plausibly succeed.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::Transport(_) => true,
      Self::Http { status, .. } => *status >= 500,
      _ => false,
    }
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self { Self::Decode(e.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
