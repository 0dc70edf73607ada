//! Observable draft state.

use chrono::{DateTime, Utc};
use outbox_core::submission::{DraftFields, Submission, SubmissionStatus};

/// Progress of the auto-save cycle, for passive display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveStatus {
  /// Nothing edited since load.
  #[default]
  Idle,
  /// Edits buffered, waiting for the debounce to elapse.
  Pending,
  /// A write is in flight.
  Saving,
  /// The last write succeeded and nothing newer is buffered.
  Saved,
  /// The last write failed; the edits are still buffered.
  Failed,
}

/// Everything the view needs to render the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSnapshot {
  /// Cached record. Its editable fields reflect the last successful save.
  pub submission:    Submission,
  /// Current, possibly unsaved, field values.
  pub fields:        DraftFields,
  pub dirty:         bool,
  pub save_status:   SaveStatus,
  pub last_saved_at: Option<DateTime<Utc>>,
  /// True while freshly loaded values are still settling into the view.
  pub suppressed:    bool,
}

impl DraftSnapshot {
  pub fn status(&self) -> SubmissionStatus { self.submission.status }

  pub fn is_editable(&self) -> bool { self.submission.is_editable() }
}
