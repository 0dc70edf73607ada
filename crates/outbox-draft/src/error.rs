//! Error types for `outbox-draft`.

use outbox_core::{Error as StoreError, submission::SubmissionStatus};
use thiserror::Error;

/// Why a submission cannot be approved yet. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApprovalError {
  #[error("Please enter a valid recipient email address")]
  InvalidRecipientEmail,

  #[error("Please enter an email subject")]
  MissingSubject,

  #[error("Please enter an invitation script")]
  MissingInvitationScript,

  #[error("At least one activity is required")]
  NoActivities,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
  /// The initial fetch failed; the editor cannot open.
  #[error("failed to load submission: {0}")]
  Load(#[source] StoreError),

  #[error(transparent)]
  Validation(#[from] ApprovalError),

  /// A manual save failed. Auto-save failures are never raised; they only
  /// show up as [`SaveStatus::Failed`](crate::SaveStatus::Failed).
  #[error("failed to save changes: {0}")]
  Save(#[source] StoreError),

  /// Approve or reject failed after its preconditions passed.
  #[error("action failed: {0}")]
  Action(#[source] StoreError),

  #[error("submission is {0} and can no longer be changed")]
  Locked(SubmissionStatus),

  #[error("draft controller has shut down")]
  Closed,
}

pub type Result<T, E = DraftError> = std::result::Result<T, E>;
