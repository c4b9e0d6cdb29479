//! Per-tick inputs to the state machine
//!
//! One poll cycle produces one [`TickEvents`] record. Timeouts arrive
//! already evaluated so the transition function stays free of clocks.

/// Signals observed during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickEvents {
    /// Rising edge of the long-press level
    pub long_press_edge: bool,
    /// Button was clicked since the last tick
    pub clicked: bool,
    /// SBC heartbeat is alive
    pub connected: bool,
    /// SBC reports that it is shutting down
    pub shutdown_flag: bool,
    /// Boot timeout elapsed since entering the current state
    pub boot_timed_out: bool,
    /// Shutdown grace period elapsed since entering the current state
    pub shutdown_elapsed: bool,
}

impl TickEvents {
    /// Number of boolean inputs, for exhaustive enumeration
    pub const INPUTS: u32 = 6;

    /// Build the events whose bits are set in `mask`
    ///
    /// Bit order follows the field order. Used to enumerate every input
    /// combination in tests and simulations.
    pub fn from_mask(mask: u32) -> Self {
        let bit = |n: u32| mask & (1 << n) != 0;
        Self {
            long_press_edge: bit(0),
            clicked: bit(1),
            connected: bit(2),
            shutdown_flag: bit(3),
            boot_timed_out: bit(4),
            shutdown_elapsed: bit(5),
        }
    }
}
