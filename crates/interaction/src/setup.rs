//! Bounded polling for collaborators that become available after startup.

use std::time::Duration;

use tracing::{debug, error};
use vista_config::SetupRetryConfig;

/// Outcome of one [`SetupRetry::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStatus {
    /// Collaborators present; setup can proceed
    Ready,
    /// Not yet; poll again after the interval
    Pending,
    /// Attempt ceiling reached; setup was abandoned
    GaveUp,
}

/// Retry counter with an interval and a hard attempt ceiling.
///
/// The host calls [`SetupRetry::tick`] from its frame loop with the elapsed
/// time; availability is only checked once per interval.
#[derive(Debug, Clone)]
pub struct SetupRetry {
    interval: Duration,
    max_attempts: u32,
    attempts: u32,
    since_last: Duration,
    status: SetupStatus,
}

impl SetupRetry {
    pub fn new(config: &SetupRetryConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts.max(1),
            attempts: 0,
            // First poll happens immediately
            since_last: Duration::from_millis(config.interval_ms),
            status: SetupStatus::Pending,
        }
    }

    pub fn status(&self) -> SetupStatus {
        self.status
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Check availability now
    pub fn poll(&mut self, available: bool) -> SetupStatus {
        if self.status != SetupStatus::Pending {
            return self.status;
        }

        self.attempts += 1;
        self.since_last = Duration::ZERO;
        if available {
            debug!("Interaction setup ready after {} attempt(s)", self.attempts);
            self.status = SetupStatus::Ready;
        } else if self.attempts >= self.max_attempts {
            error!(
                "Interaction setup gave up after {} attempts; camera, viewport or scene never became available",
                self.attempts
            );
            self.status = SetupStatus::GaveUp;
        }
        self.status
    }

    /// Advance time; polls `available` once the interval has elapsed
    pub fn tick(&mut self, elapsed: Duration, available: impl FnOnce() -> bool) -> SetupStatus {
        if self.status != SetupStatus::Pending {
            return self.status;
        }
        self.since_last += elapsed;
        if self.since_last < self.interval {
            return SetupStatus::Pending;
        }
        self.poll(available())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(interval_ms: u64, max_attempts: u32) -> SetupRetryConfig {
        SetupRetryConfig {
            interval_ms,
            max_attempts,
        }
    }

    #[test]
    fn test_ready_on_first_available_poll() {
        let mut retry = SetupRetry::new(&config(100, 50));
        assert_eq!(retry.tick(Duration::ZERO, || true), SetupStatus::Ready);
        assert_eq!(retry.attempts(), 1);
    }

    #[test]
    fn test_polls_only_once_per_interval() {
        let mut retry = SetupRetry::new(&config(100, 50));
        retry.tick(Duration::ZERO, || false);

        let mut checks = 0;
        for _ in 0..9 {
            retry.tick(Duration::from_millis(10), || {
                checks += 1;
                false
            });
        }
        assert_eq!(checks, 0);
        retry.tick(Duration::from_millis(10), || {
            checks += 1;
            false
        });
        assert_eq!(checks, 1);
    }

    #[test]
    fn test_gives_up_at_ceiling_and_stays_given_up() {
        let mut retry = SetupRetry::new(&config(100, 3));

        assert_eq!(retry.poll(false), SetupStatus::Pending);
        assert_eq!(retry.poll(false), SetupStatus::Pending);
        assert_eq!(retry.poll(false), SetupStatus::GaveUp);
        assert_eq!(retry.poll(true), SetupStatus::GaveUp);
        assert_eq!(retry.attempts(), 3);
    }
}
