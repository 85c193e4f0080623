//! Bounded polling. The original firmware hid fixed attempt counts inside
//! blocking waits; here they are an explicit (count, interval) policy so the
//! firmware passes a real delay and tests pass a zero-delay sleeper.

use std::time::Duration;

/// A bounded poll: up to `attempts` checks spaced `interval` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Upper bound on the total time spent inside `poll_until`.
    pub fn budget(&self) -> Duration {
        self.interval * self.attempts
    }
}

/// Polls `check` until it passes or the policy's attempts are exhausted.
/// `sleep` runs between checks, never after the last one. Returns whether
/// `check` ever passed.
pub fn poll_until(
    policy: RetryPolicy,
    mut check: impl FnMut() -> bool,
    mut sleep: impl FnMut(Duration),
) -> bool {
    for attempt in 0..policy.attempts {
        if check() {
            return true;
        }
        if attempt + 1 < policy.attempts {
            sleep(policy.interval);
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeds_without_sleeping_when_first_check_passes() {
        let mut sleeps = 0;
        let ok = poll_until(
            RetryPolicy::new(5, Duration::from_millis(500)),
            || true,
            |_| sleeps += 1,
        );
        assert!(ok);
        assert_eq!(sleeps, 0);
    }

    #[test]
    fn performs_exactly_the_configured_attempts_on_failure() {
        let mut checks = 0;
        let mut sleeps = 0;
        let ok = poll_until(
            RetryPolicy::new(40, Duration::from_millis(500)),
            || {
                checks += 1;
                false
            },
            |_| sleeps += 1,
        );
        assert!(!ok);
        assert_eq!(checks, 40);
        assert_eq!(sleeps, 39);
    }

    #[test]
    fn stops_as_soon_as_a_check_passes() {
        let mut checks = 0;
        let ok = poll_until(
            RetryPolicy::new(10, Duration::ZERO),
            || {
                checks += 1;
                checks == 3
            },
            |_| {},
        );
        assert!(ok);
        assert_eq!(checks, 3);
    }

    #[test]
    fn zero_attempts_never_checks() {
        let mut checks = 0;
        let ok = poll_until(RetryPolicy::new(0, Duration::ZERO), || {
            checks += 1;
            true
        }, |_| {});
        assert!(!ok);
        assert_eq!(checks, 0);
    }

    #[test]
    fn budget_is_attempts_times_interval() {
        let policy = RetryPolicy::new(40, Duration::from_millis(500));
        assert_eq!(policy.budget(), Duration::from_secs(20));
    }
}
