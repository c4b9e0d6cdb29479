//! Heartbeat liveness monitor
//!
//! The SBC increments a counter register while it is alive. The monitor
//! samples it on a fixed period and infers connectivity with asymmetric
//! hysteresis: one changed sample reconnects immediately, while only a run
//! of stale samples disconnects.

/// Period between heartbeat checks
pub const HEARTBEAT_PERIOD_MS: u32 = 2000;

/// Consecutive stale checks before the link is declared lost
pub const MAX_STALE_CHECKS: u8 = 30;

/// Outcome of one heartbeat check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeartbeatEvent {
    /// Counter changed while already connected
    Alive { counter: u16 },
    /// Counter changed while disconnected; link is up again
    Restored { counter: u16 },
    /// Counter unchanged while connected
    Stale { retries: u8 },
    /// Stale threshold reached; link is down
    Lost,
    /// Counter unchanged while disconnected
    Waiting,
}

/// Connectivity state derived from the SBC heartbeat counter
///
/// State is only ever reset by a process restart.
#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    last_counter: u16,
    retry_count: u8,
    connected: bool,
    max_retries: u8,
}

impl Default for HeartbeatMonitor {
    fn default() -> Self {
        Self::new(MAX_STALE_CHECKS)
    }
}

impl HeartbeatMonitor {
    /// Create a disconnected monitor
    pub fn new(max_retries: u8) -> Self {
        Self {
            last_counter: 0,
            retry_count: 0,
            connected: false,
            max_retries: max_retries.max(1),
        }
    }

    /// Evaluate one sample of the SBC counter
    pub fn check(&mut self, counter: u16) -> HeartbeatEvent {
        if counter != self.last_counter {
            self.last_counter = counter;
            self.retry_count = 0;
            let was_connected = self.connected;
            self.connected = true;
            return if was_connected {
                HeartbeatEvent::Alive { counter }
            } else {
                HeartbeatEvent::Restored { counter }
            };
        }

        if !self.connected {
            return HeartbeatEvent::Waiting;
        }

        self.retry_count = self.retry_count.saturating_add(1);
        if self.retry_count >= self.max_retries {
            self.retry_count = self.max_retries;
            self.connected = false;
            HeartbeatEvent::Lost
        } else {
            HeartbeatEvent::Stale {
                retries: self.retry_count,
            }
        }
    }

    /// Whether the SBC is considered alive
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Consecutive stale checks so far
    pub fn retry_count(&self) -> u8 {
        self.retry_count
    }

    /// Last counter value seen
    pub fn last_counter(&self) -> u16 {
        self.last_counter
    }
}

/// Gate that lets a periodic check run once per period
///
/// The timer starts at the first call, so the first check happens one full
/// period later. Uses wrapping subtraction on a millisecond clock.
#[derive(Debug, Clone)]
pub struct CheckTimer {
    period_ms: u32,
    last_ms: Option<u32>,
}

impl CheckTimer {
    /// Create a timer with the given period
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: None,
        }
    }

    /// Returns true when a check is due at `now_ms`, and restarts the period
    pub fn due(&mut self, now_ms: u32) -> bool {
        match self.last_ms {
            None => {
                self.last_ms = Some(now_ms);
                false
            }
            Some(last) if now_ms.wrapping_sub(last) >= self.period_ms => {
                self.last_ms = Some(now_ms);
                true
            }
            Some(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn connected_monitor() -> HeartbeatMonitor {
        let mut monitor = HeartbeatMonitor::default();
        assert_eq!(
            monitor.check(1),
            HeartbeatEvent::Restored { counter: 1 }
        );
        monitor
    }

    #[test]
    fn test_starts_disconnected() {
        let mut monitor = HeartbeatMonitor::default();
        assert!(!monitor.connected());

        // Register still at its boot value
        assert_eq!(monitor.check(0), HeartbeatEvent::Waiting);
        assert_eq!(monitor.retry_count(), 0);
    }

    #[test]
    fn test_disconnects_exactly_on_threshold() {
        let mut monitor = connected_monitor();

        for i in 1..MAX_STALE_CHECKS {
            assert_eq!(monitor.check(1), HeartbeatEvent::Stale { retries: i });
            assert!(monitor.connected());
        }
        assert_eq!(monitor.check(1), HeartbeatEvent::Lost);
        assert!(!monitor.connected());
        assert_eq!(monitor.retry_count(), MAX_STALE_CHECKS);

        // Clamped while disconnected
        assert_eq!(monitor.check(1), HeartbeatEvent::Waiting);
        assert_eq!(monitor.retry_count(), MAX_STALE_CHECKS);
    }

    #[test]
    fn test_reconnects_on_first_change() {
        let mut monitor = connected_monitor();
        for _ in 0..MAX_STALE_CHECKS {
            monitor.check(1);
        }
        assert!(!monitor.connected());

        assert_eq!(monitor.check(2), HeartbeatEvent::Restored { counter: 2 });
        assert!(monitor.connected());
        assert_eq!(monitor.retry_count(), 0);
    }

    #[test]
    fn test_change_at_last_retry_resets() {
        let mut monitor = connected_monitor();
        for _ in 1..MAX_STALE_CHECKS {
            monitor.check(1);
        }
        assert_eq!(monitor.retry_count(), MAX_STALE_CHECKS - 1);

        assert_eq!(monitor.check(2), HeartbeatEvent::Alive { counter: 2 });
        assert_eq!(monitor.retry_count(), 0);
        assert!(monitor.connected());
    }

    #[test]
    fn test_counter_wraparound_counts_as_change() {
        let mut monitor = HeartbeatMonitor::default();
        monitor.check(u16::MAX);
        assert_eq!(monitor.check(0), HeartbeatEvent::Alive { counter: 0 });
    }

    #[test]
    fn test_check_timer_first_call_starts_period() {
        let mut timer = CheckTimer::new(HEARTBEAT_PERIOD_MS);
        assert!(!timer.due(1000));
        assert!(!timer.due(2999));
        assert!(timer.due(3000));
        assert!(!timer.due(3001));
        assert!(timer.due(5000));
    }

    #[test]
    fn test_check_timer_wraparound() {
        let mut timer = CheckTimer::new(HEARTBEAT_PERIOD_MS);
        timer.due(u32::MAX - 500);
        assert!(!timer.due(1000));
        assert!(timer.due(1500));
    }

    proptest! {
        #[test]
        fn test_stale_run_disconnects_on_exact_check(
            stale_before in 0u8..MAX_STALE_CHECKS,
            counter in 1u16..,
        ) {
            let mut monitor = HeartbeatMonitor::default();
            monitor.check(counter);

            for _ in 0..stale_before {
                monitor.check(counter);
            }
            prop_assert!(monitor.connected());

            // A fresh change always restores a clean slate
            let next = counter.wrapping_add(1);
            monitor.check(next);
            prop_assert_eq!(monitor.retry_count(), 0);

            let mut lost_at = None;
            for n in 1..=MAX_STALE_CHECKS {
                if monitor.check(next) == HeartbeatEvent::Lost {
                    lost_at = Some(n);
                    break;
                }
            }
            prop_assert_eq!(lost_at, Some(MAX_STALE_CHECKS));
        }
    }
}
