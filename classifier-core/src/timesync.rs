//! Wall-clock synchronization state machine. The SNTP exchange itself is a
//! firmware concern; this module owns the "is the clock plausible yet"
//! polling that gates TLS certificate validation.

use serde::{Deserialize, Serialize};

use crate::retry::{poll_until, RetryPolicy};

/// Whether the wall clock has a plausible SNTP fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSyncState {
    Unsynced,
    Synced,
}

impl TimeSyncState {
    pub fn is_synced(self) -> bool {
        matches!(self, TimeSyncState::Synced)
    }
}

/// Two days past the Unix epoch. A clock still at its boot default reads
/// near zero, so anything past this is treated as a real SNTP fix.
pub const CLOCK_SANITY_EPOCH_SECS: u64 = 2 * 24 * 3600;

pub fn clock_is_plausible(unix_secs: u64) -> bool {
    unix_secs >= CLOCK_SANITY_EPOCH_SECS
}

/// Bounded wait for the clock to become plausible after an SNTP kick-off.
pub struct TimeSync {
    policy: RetryPolicy,
    state: TimeSyncState,
}

impl TimeSync {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: TimeSyncState::Unsynced,
        }
    }

    pub fn status(&self) -> TimeSyncState {
        self.state
    }

    /// Polls `now_unix` against the sanity threshold within the policy's
    /// budget. Never blocks past it; Unsynced is a reportable outcome, not
    /// an error.
    pub fn synchronize(
        &mut self,
        mut now_unix: impl FnMut() -> u64,
        sleep: impl FnMut(std::time::Duration),
    ) -> TimeSyncState {
        let synced = poll_until(self.policy, || clock_is_plausible(now_unix()), sleep);
        self.state = if synced {
            log::info!("clock synchronized");
            TimeSyncState::Synced
        } else {
            log::warn!("clock still implausible after {} attempts, TLS may fail", self.policy.attempts);
            TimeSyncState::Unsynced
        };
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn boot_default_clock_is_implausible() {
        assert!(!clock_is_plausible(0));
        assert!(!clock_is_plausible(CLOCK_SANITY_EPOCH_SECS - 1));
        assert!(clock_is_plausible(CLOCK_SANITY_EPOCH_SECS));
    }

    #[test]
    fn synchronize_reports_synced_once_the_clock_jumps() {
        let mut sync = TimeSync::new(RetryPolicy::new(20, Duration::from_millis(500)));
        let mut now = 0u64;
        let state = sync.synchronize(
            || {
                // The SNTP fix lands on the second poll.
                now += CLOCK_SANITY_EPOCH_SECS / 2;
                now
            },
            |_| {},
        );
        assert_eq!(state, TimeSyncState::Synced);
        assert!(sync.status().is_synced());
    }

    #[test]
    fn synchronize_gives_up_after_the_configured_attempts() {
        let mut sync = TimeSync::new(RetryPolicy::new(20, Duration::ZERO));
        let mut polls = 0;
        let state = sync.synchronize(
            || {
                polls += 1;
                0
            },
            |_| {},
        );
        assert_eq!(state, TimeSyncState::Unsynced);
        assert_eq!(polls, 20);
    }
}
