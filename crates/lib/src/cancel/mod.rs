//! Cooperative cancellation for blocking reads.
//!
//! A [`CancelToken`] is checked between poll attempts. Tokens are independent
//! unless cloned: cancelling a token cancels its clones and nothing else.
//! Tokens handed out by [`signal::install`] additionally fire on any
//! SIGINT/SIGTERM delivered after they were created.

pub mod signal;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
  cancelled: Arc<AtomicBool>,
  deadline: Option<Instant>,
  /// Signal generation at creation, for tokens that observe signals.
  signal_epoch: Option<u64>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  /// Also treat the token as cancelled once `deadline` has passed.
  pub fn with_deadline(mut self, deadline: Instant) -> Self {
    self.deadline = Some(match self.deadline {
      Some(existing) => existing.min(deadline),
      None => deadline,
    });
    self
  }

  pub fn with_timeout(self, timeout: Duration) -> Self {
    self.with_deadline(Instant::now() + timeout)
  }

  pub(crate) fn observing_signals(mut self) -> Self {
    self.signal_epoch = Some(signal::generation());
    self
  }

  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::Release);
  }

  pub fn is_cancelled(&self) -> bool {
    if self.cancelled.load(Ordering::Acquire) {
      return true;
    }
    if matches!(self.signal_epoch, Some(epoch) if signal::generation() != epoch) {
      return true;
    }
    matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
  }

  fn remaining(&self) -> Option<Duration> {
    self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
  }
}

/// Call `attempt` every `interval` until it yields a value or `cancel` fires.
///
/// `attempt` always runs at least once, so a value that is already present is
/// returned even through a cancelled token. Returns `Ok(None)` on
/// cancellation. Errors from `attempt` end the wait immediately.
pub fn poll_until<T, E, F>(interval: Duration, cancel: &CancelToken, mut attempt: F) -> Result<Option<T>, E>
where
  F: FnMut() -> Result<Option<T>, E>,
{
  let mut polls: u64 = 0;
  loop {
    if let Some(value) = attempt()? {
      return Ok(Some(value));
    }
    polls += 1;

    if cancel.is_cancelled() {
      trace!(polls, "wait cancelled");
      return Ok(None);
    }

    let nap = match cancel.remaining() {
      Some(remaining) => interval.min(remaining),
      None => interval,
    };
    std::thread::sleep(nap);
  }
}
