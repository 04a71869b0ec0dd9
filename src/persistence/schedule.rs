//! Auto-save deadline tracking.

use std::time::Duration;

use tokio::time::Instant;

/// Deadline for the next auto-save.
///
/// Normal cadence is `interval`, pushed back by user activity. A failed
/// backend save arms exactly one retry after `retry_backoff`; whatever that
/// retry's outcome, the schedule returns to the normal cadence.
#[derive(Debug, Clone)]
pub struct AutoSaveSchedule {
    interval: Duration,
    retry_backoff: Duration,
    deadline: Instant,
    retrying: bool,
}

impl AutoSaveSchedule {
    pub fn new(interval: Duration, retry_backoff: Duration, now: Instant) -> Self {
        Self {
            interval,
            retry_backoff,
            deadline: now + interval,
            retrying: false,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_retrying(&self) -> bool {
        self.retrying
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// User activity: restart the normal interval.
    pub fn reset(&mut self, now: Instant) {
        self.retrying = false;
        self.deadline = now + self.interval;
    }

    /// Record a successful save.
    pub fn on_save_succeeded(&mut self, now: Instant) {
        self.reset(now);
    }

    /// Record a failed backend save. Returns `true` when a retry was armed.
    pub fn on_save_failed(&mut self, now: Instant) -> bool {
        if self.retrying {
            self.reset(now);
            false
        } else {
            self.retrying = true;
            self.deadline = now + self.retry_backoff;
            true
        }
    }

    /// Nothing needed saving; wait for the next interval.
    pub fn skip(&mut self, now: Instant) {
        self.deadline = now + self.interval;
    }
}
