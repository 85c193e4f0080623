//! Link establishment state machine. The Wi-Fi driver is a collaborator
//! behind [`LinkInterface`]; the bounded connect/poll sequencing lives here
//! so it can run against a mock on the host.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::{poll_until, RetryPolicy};

/// Network link status. Written only by [`Connectivity`]; read by the
/// capture path as a precondition gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

impl LinkState {
    pub fn is_connected(self) -> bool {
        matches!(self, LinkState::Connected)
    }
}

/// Low-level link driver (the Wi-Fi stack on device).
pub trait LinkInterface {
    /// Link associated and an address assigned.
    fn is_up(&self) -> bool;

    /// Kick off one association handshake. Completion is observed through
    /// `is_up`; returning false means the handshake could not even start.
    fn start_handshake(&mut self) -> bool;
}

/// Bounded link supervisor. `connect` is idempotent: when the link is
/// already up it reports success without touching the driver's handshake
/// path.
pub struct Connectivity<I: LinkInterface> {
    iface: I,
    policy: RetryPolicy,
    state: LinkState,
}

impl<I: LinkInterface> Connectivity<I> {
    pub fn new(iface: I, policy: RetryPolicy) -> Self {
        Self {
            iface,
            policy,
            state: LinkState::Disconnected,
        }
    }

    pub fn status(&self) -> LinkState {
        self.state
    }

    /// Re-reads the driver. The link can drop between capture cycles
    /// without any call having failed.
    pub fn refresh(&mut self) -> LinkState {
        self.state = if self.iface.is_up() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        };
        self.state
    }

    /// Establishes the link: a no-op when already up, otherwise one
    /// handshake followed by the configured poll budget. Exhaustion leaves
    /// the state Disconnected; callers decide whether to try again.
    pub fn connect(&mut self, sleep: impl FnMut(Duration)) -> LinkState {
        if self.iface.is_up() {
            log::info!("link already up");
            self.state = LinkState::Connected;
            return self.state;
        }

        self.state = LinkState::Connecting;
        if !self.iface.start_handshake() {
            log::error!("link handshake failed to start");
            self.state = LinkState::Disconnected;
            return self.state;
        }

        let up = poll_until(self.policy, || self.iface.is_up(), sleep);
        self.state = if up {
            log::info!("link up");
            LinkState::Connected
        } else {
            log::warn!(
                "link still down after {} attempts ({:?} budget)",
                self.policy.attempts,
                self.policy.budget()
            );
            LinkState::Disconnected
        };
        self.state
    }

    pub fn interface(&self) -> &I {
        &self.iface
    }

    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.iface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeLink {
        up: bool,
        handshakes: u32,
        /// Polls remaining before the link reports up; None = never.
        up_after: Option<u32>,
        polls: u32,
    }

    impl FakeLink {
        fn down(up_after: Option<u32>) -> Self {
            Self {
                up: false,
                handshakes: 0,
                up_after,
                polls: 0,
            }
        }
    }

    // Interior mutability so the shared-borrow poll path can count probes.
    struct CountingLink(std::cell::RefCell<FakeLink>);

    impl LinkInterface for CountingLink {
        fn is_up(&self) -> bool {
            let mut inner = self.0.borrow_mut();
            inner.polls += 1;
            if let Some(left) = inner.up_after {
                if left == 0 {
                    inner.up = true;
                } else {
                    inner.up_after = Some(left - 1);
                }
            }
            inner.up
        }

        fn start_handshake(&mut self) -> bool {
            self.0.get_mut().handshakes += 1;
            true
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(40, Duration::from_millis(500))
    }

    #[test]
    fn connect_when_already_up_skips_the_handshake() {
        let link = CountingLink(std::cell::RefCell::new(FakeLink {
            up: true,
            ..FakeLink::down(None)
        }));
        let mut conn = Connectivity::new(link, policy());
        assert_eq!(conn.connect(|_| {}), LinkState::Connected);
        assert_eq!(conn.interface().0.borrow().handshakes, 0);
        assert_eq!(conn.status(), LinkState::Connected);
    }

    #[test]
    fn connect_polls_until_the_link_comes_up() {
        let link = CountingLink(std::cell::RefCell::new(FakeLink::down(Some(3))));
        let mut conn = Connectivity::new(link, policy());
        assert_eq!(conn.connect(|_| {}), LinkState::Connected);
        assert_eq!(conn.interface().0.borrow().handshakes, 1);
    }

    #[test]
    fn connect_exhaustion_reports_disconnected_after_exact_attempts() {
        let link = CountingLink(std::cell::RefCell::new(FakeLink::down(None)));
        let mut conn = Connectivity::new(link, RetryPolicy::new(5, Duration::ZERO));
        let mut sleeps = 0;
        assert_eq!(conn.connect(|_| sleeps += 1), LinkState::Disconnected);
        // One pre-handshake is_up probe plus the five poll attempts.
        assert_eq!(conn.interface().0.borrow().polls, 6);
        assert_eq!(sleeps, 4);
        assert_eq!(conn.status(), LinkState::Disconnected);
    }

    #[test]
    fn refresh_tracks_a_dropped_link() {
        let link = CountingLink(std::cell::RefCell::new(FakeLink {
            up: true,
            ..FakeLink::down(None)
        }));
        let mut conn = Connectivity::new(link, policy());
        conn.connect(|_| {});
        conn.interface().0.borrow_mut().up = false;
        assert_eq!(conn.refresh(), LinkState::Disconnected);
    }
}
