//! Software PWM
//!
//! Bit-banged PWM for pins without a free hardware slice. A period is 256
//! ticks and a channel is high while the period position is below its duty.
//! The comparison runs every tick, so a duty change takes effect at once.
//!
//! Duties live in [`SoftPwmDuties`] so that one task can change them while
//! another runs [`SoftPwm::tick`] at a fixed rate.

use portable_atomic::{AtomicU8, Ordering};

/// Ticks per PWM period
pub const PWM_PERIOD: u16 = 256;

/// Duty cycles shared between the writer and the ticking task
pub struct SoftPwmDuties<const N: usize> {
    duties: [AtomicU8; N],
}

impl<const N: usize> Default for SoftPwmDuties<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SoftPwmDuties<N> {
    /// All channels at duty 0
    pub const fn new() -> Self {
        Self {
            duties: [const { AtomicU8::new(0) }; N],
        }
    }

    /// Set one channel's duty; out-of-range channels are ignored
    pub fn set(&self, channel: usize, duty: u8) {
        if let Some(slot) = self.duties.get(channel) {
            slot.store(duty, Ordering::Relaxed);
        }
    }

    /// Read one channel's duty; out-of-range channels read 0
    pub fn get(&self, channel: usize) -> u8 {
        self.duties
            .get(channel)
            .map(|slot| slot.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

/// PWM counter producing the output level of each channel per tick
#[derive(Debug, Clone)]
pub struct SoftPwm<const N: usize> {
    counter: u8,
}

impl<const N: usize> Default for SoftPwm<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SoftPwm<N> {
    pub const fn new() -> Self {
        Self { counter: 0 }
    }

    /// Advance one tick and return the level of every channel
    pub fn tick(&mut self, duties: &SoftPwmDuties<N>) -> [bool; N] {
        let counter = self.counter;
        self.counter = counter.wrapping_add(1);
        core::array::from_fn(|channel| counter < duties.get(channel))
    }

    /// Position within the period of the next tick
    pub fn counter(&self) -> u8 {
        self.counter
    }
}
