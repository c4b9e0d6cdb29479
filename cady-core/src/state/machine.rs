//! State machine definition
//!
//! SBC power, peripheral enablement and LED effects are all a function of
//! the current state; see [`crate::lifecycle`] for the entry actions.

use super::events::TickEvents;

/// Supervisor states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppState {
    /// SBC unpowered, waiting for a click
    Off,
    /// SBC powered, waiting for its first heartbeat
    Booting,
    /// SBC heartbeat alive
    Connected,
    /// Shutdown requested, waiting out the grace period
    ShuttingDown,
    /// Boot or connectivity failure; only a click leaves this state
    Error,
}

/// Why the supervisor entered [`AppState::Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// No heartbeat within the boot timeout
    BootTimeout,
    /// Heartbeat went stale while connected
    ConnectionLost,
}

impl AppState {
    /// Every state, for exhaustive iteration
    pub const ALL: [AppState; 5] = [
        AppState::Off,
        AppState::Booting,
        AppState::Connected,
        AppState::ShuttingDown,
        AppState::Error,
    ];

    /// Check if this state asks the SBC to shut down
    pub fn requests_shutdown(&self) -> bool {
        matches!(self, AppState::ShuttingDown)
    }

    /// Compute the state for the next tick
    ///
    /// Rules are checked in priority order and the first match wins. A
    /// long-press edge returns [`AppState::Off`] from every state, including
    /// `Off` itself; callers re-run the entry action in that case.
    pub fn next(self, events: &TickEvents) -> Self {
        use AppState::*;

        if events.long_press_edge {
            return Off;
        }

        match self {
            Off if events.clicked => Booting,

            Booting if events.connected => Connected,
            Booting if events.boot_timed_out => Error,

            Connected if !events.connected => Error,
            Connected if events.shutdown_flag || events.clicked => ShuttingDown,

            ShuttingDown if events.shutdown_elapsed => Off,

            Error if events.clicked => Off,

            // Default: stay in current state
            _ => self,
        }
    }

    /// Error cause of a `from -> to` transition, if it is a failure
    pub fn error_cause(from: AppState, to: AppState) -> Option<ErrorKind> {
        match (from, to) {
            (AppState::Booting, AppState::Error) => Some(ErrorKind::BootTimeout),
            (AppState::Connected, AppState::Error) => Some(ErrorKind::ConnectionLost),
            _ => None,
        }
    }
}
