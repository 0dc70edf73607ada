//! Single-slot cancellable timer.
//!
//! Each draft owns one [`DebounceTimer`] for auto-save. Arming replaces the
//! previous deadline instead of stacking a second one, so only the most
//! recent arm can fire.

use std::{future, time::Duration};

use tokio::time::{Instant, sleep_until};

#[derive(Debug)]
pub struct DebounceTimer {
  delay:    Duration,
  deadline: Option<Instant>,
}

impl DebounceTimer {
  /// A disarmed timer that fires `delay` after each [`arm`](Self::arm).
  pub fn new(delay: Duration) -> Self { Self { delay, deadline: None } }

  pub fn delay(&self) -> Duration { self.delay }

  /// (Re)start the countdown from now.
  pub fn arm(&mut self) { self.deadline = Some(Instant::now() + self.delay); }

  /// Disarm. Returns whether a deadline was pending.
  pub fn cancel(&mut self) -> bool { self.deadline.take().is_some() }

  pub fn is_armed(&self) -> bool { self.deadline.is_some() }

  /// Resolve when the current deadline passes, then disarm.
  ///
  /// Pending forever while disarmed. Cancel-safe: dropping the future before
  /// it resolves leaves the deadline in place.
  pub async fn fired(&mut self) {
    match self.deadline {
      Some(deadline) => {
        sleep_until(deadline).await;
        self.deadline = None;
      }
      None => future::pending().await,
    }
  }
}
