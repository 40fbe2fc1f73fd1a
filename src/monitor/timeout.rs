use std::time::{Duration, Instant};

/// Deadline check for one monitored run.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutEnforcer {
    start: Instant,
    timeout: Option<Duration>,
}

impl TimeoutEnforcer {
    pub fn new(start: Instant, timeout: Option<Duration>) -> Self {
        Self { start, timeout }
    }

    /// True iff a timeout is configured and strictly more than it has elapsed.
    pub fn expired(&self, now: Instant) -> bool {
        self.timeout
            .is_some_and(|limit| now.saturating_duration_since(self.start) > limit)
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }
}
