//! Notifications for the UI layer.
//!
//! The UI is out of the core's hands; the driver queues [`UiEvent`]s and
//! whoever owns the screen drains them.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Sprites and other assets are ready.
    ResourcesLoaded,
    /// The server cannot be reached or a send failed.
    ConnectionFailure,
}

/// Keeps a failing transport from flooding the UI with one failure per
/// frame.
///
/// The first failure of a streak is reported; further failures are reported
/// at most once per `interval`. A successful send ends the streak.
#[derive(Debug, Clone)]
pub struct FailureLimiter {
    interval: Duration,
    last_reported: Option<Duration>,
    suppressed: u32,
}

impl FailureLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_reported: None,
            suppressed: 0,
        }
    }

    /// Records a failure at `now`; true if it should be surfaced.
    pub fn record_failure(&mut self, now: Duration) -> bool {
        match self.last_reported {
            Some(at) if now.saturating_sub(at) < self.interval => {
                self.suppressed += 1;
                false
            }
            _ => {
                self.last_reported = Some(now);
                self.suppressed = 0;
                true
            }
        }
    }

    pub fn record_success(&mut self) {
        self.last_reported = None;
        self.suppressed = 0;
    }

    /// Failures swallowed since the last report.
    pub fn suppressed(&self) -> u32 {
        self.suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn reports_once_per_interval() {
        let mut limiter = FailureLimiter::new(ms(1000));
        assert!(limiter.record_failure(ms(0)));
        assert!(!limiter.record_failure(ms(16)));
        assert!(!limiter.record_failure(ms(999)));
        assert_eq!(limiter.suppressed(), 2);
        assert!(limiter.record_failure(ms(1000)));
        assert_eq!(limiter.suppressed(), 0);
    }

    #[test]
    fn success_ends_the_streak() {
        let mut limiter = FailureLimiter::new(ms(1000));
        assert!(limiter.record_failure(ms(0)));
        limiter.record_success();
        assert!(limiter.record_failure(ms(10)));
    }
}
