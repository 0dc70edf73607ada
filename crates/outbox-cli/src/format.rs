//! Display helpers shared by the list and edit panes.

use chrono::{DateTime, Local, NaiveDate, Utc};
use outbox_draft::{DraftSnapshot, SaveStatus};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// `Just now`, `5m ago`, `3h ago`, `2d ago`; older than a week falls back
/// to [`short_date`].
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let secs = (now - at).num_seconds();
  match secs {
    s if s < MINUTE => "Just now".into(),
    s if s < HOUR => format!("{}m ago", s / MINUTE),
    s if s < DAY => format!("{}h ago", s / HOUR),
    s if s < WEEK => format!("{}d ago", s / DAY),
    _ => short_date(at),
  }
}

/// `Mar 4, 2025`
pub fn short_date(at: DateTime<Utc>) -> String { at.format("%b %-d, %Y").to_string() }

/// `March 4, 2025`
pub fn long_date(at: DateTime<Utc>) -> String { at.format("%B %-d, %Y").to_string() }

/// `Tuesday, March 4, 2025`. Calendar dates carry no time zone and are
/// shown as-is.
pub fn calendar_date(date: NaiveDate) -> String { date.format("%A, %B %-d, %Y").to_string() }

/// Text before the first comma: `"Austin, TX, USA"` → `"Austin"`.
pub fn first_segment(s: &str) -> &str { s.split(',').next().unwrap_or(s).trim() }

/// `"$50 per person"` → `"$50"`.
pub fn first_word(s: &str) -> &str { s.split_whitespace().next().unwrap_or("") }

/// The editor's save indicator; `None` until something has been edited.
pub fn save_indicator(snap: &DraftSnapshot) -> Option<String> {
  match snap.save_status {
    SaveStatus::Saving => Some("Saving…".into()),
    SaveStatus::Failed => Some("Auto-save failed".into()),
    SaveStatus::Pending => Some("Unsaved changes".into()),
    SaveStatus::Saved => match snap.last_saved_at {
      Some(at) => Some(format!("Saved {}", at.with_timezone(&Local).format("%H:%M:%S"))),
      None => Some("Saved".into()),
    },
    SaveStatus::Idle if snap.dirty => Some("Unsaved changes".into()),
    SaveStatus::Idle => None,
  }
}
