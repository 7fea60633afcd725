//! Resettable debounce timer.
//!
//! Debouncing collapses a burst of saves (editor auto-save, formatters,
//! `git checkout`) into one trigger fired after the tree has been quiet
//! for the full period.

use tokio::time::{Duration, Instant, sleep_until};

/// Quiet period required after the last qualifying change.
pub const DEBOUNCE_PERIOD: Duration = Duration::from_secs(3);

/// A single "pending until T" alarm.
///
/// At most one firing is ever pending: `reset` moves the deadline instead
/// of scheduling another one.
#[derive(Debug)]
pub struct DebounceTimer {
    period: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    /// Create an idle timer.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
        }
    }

    /// Create a timer whose first firing is due immediately.
    pub fn armed(period: Duration) -> Self {
        Self {
            period,
            deadline: Some(Instant::now()),
        }
    }

    /// Postpone the firing to one full period from now.
    pub fn reset(&mut self) {
        self.deadline = Some(Instant::now() + self.period);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the firing if its deadline has passed.
    pub fn take_ready(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Resolve once the pending deadline is reached; never if idle.
    ///
    /// Does not consume the firing. Callers follow up with `take_ready`,
    /// which keeps this safe to drop inside `tokio::select!`.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}
