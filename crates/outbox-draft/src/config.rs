//! Controller timing.

use std::time::Duration;

/// Shortest suppression window after load. Suppression must outlive the tick
/// in which the fields were populated.
pub const MIN_LOAD_GRACE: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftConfig {
  /// Quiet period after the last edit before an auto-save runs.
  pub debounce:   Duration,
  /// How long edits are ignored after the record is loaded.
  pub load_grace: Duration,
}

impl Default for DraftConfig {
  fn default() -> Self {
    Self {
      debounce:   Duration::from_secs(2),
      load_grace: Duration::from_millis(500),
    }
  }
}

impl DraftConfig {
  pub fn from_millis(debounce_ms: u64, load_grace_ms: u64) -> Self {
    Self {
      debounce:   Duration::from_millis(debounce_ms),
      load_grace: Duration::from_millis(load_grace_ms),
    }
  }

  /// Clamp `load_grace` up to [`MIN_LOAD_GRACE`].
  pub fn normalized(self) -> Self {
    Self { load_grace: self.load_grace.max(MIN_LOAD_GRACE), ..self }
  }
}
