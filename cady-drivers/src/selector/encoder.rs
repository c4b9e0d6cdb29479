//! Rotary encoder selector
//!
//! Clock/direction encoder polled every cycle. A falling clock edge counts
//! one step in the direction given by the direction line, then further
//! edges are ignored for the debounce window. A clock held low counts once.

use cady_core::config::{ButtonConfig, SelectorConfig};
use cady_core::traits::{ButtonInput, SelectorInput};
use cady_hal::InputPin;

use crate::button::Button;

/// Encoder position wrapping in `0..=max_value`
#[derive(Debug, Clone)]
pub struct EncoderCounter {
    value: u8,
    max_value: u8,
    invert_direction: bool,
    debounce_ms: u32,
    debounce_from: Option<u32>,
    clock_was_high: bool,
}

impl EncoderCounter {
    pub fn new(config: &SelectorConfig) -> Self {
        Self {
            value: 0,
            max_value: config.max_value(),
            invert_direction: config.invert_direction,
            debounce_ms: config.debounce_ms,
            debounce_from: None,
            clock_was_high: true,
        }
    }

    /// Feed one sample of the clock and direction lines
    pub fn sample(&mut self, clock_high: bool, direction_high: bool, now_ms: u32) {
        let falling = self.clock_was_high && !clock_high;
        self.clock_was_high = clock_high;

        if let Some(from) = self.debounce_from {
            if now_ms.wrapping_sub(from) < self.debounce_ms {
                return;
            }
            self.debounce_from = None;
        }

        if !falling {
            return;
        }

        self.debounce_from = Some(now_ms);
        if direction_high != self.invert_direction {
            self.value = if self.value >= self.max_value {
                0
            } else {
                self.value + 1
            };
        } else {
            self.value = match self.value {
                0 => self.max_value,
                v => (v - 1).min(self.max_value),
            };
        }
    }

    /// Current position
    pub fn value(&self) -> u8 {
        self.value
    }
}

/// Encoder selector with an apply button
pub struct EncoderSelector<P> {
    clock: P,
    direction: P,
    apply: Button<P>,
    counter: EncoderCounter,
    applied: u8,
}

impl<P: InputPin> EncoderSelector<P> {
    pub fn new(clock: P, direction: P, apply: P, config: &SelectorConfig) -> Self {
        let apply_config = ButtonConfig {
            active_low: config.apply_active_low,
            ..ButtonConfig::default()
        };
        Self {
            clock,
            direction,
            apply: Button::new(apply, &apply_config),
            counter: EncoderCounter::new(config),
            applied: 0,
        }
    }

    /// Sample the encoder and the apply button
    ///
    /// Returns the newly applied value on an apply click.
    pub fn update(&mut self, now_ms: u32) -> Option<u8> {
        let clock_high = self.clock.is_high();
        let direction_high = self.direction.is_high();
        self.counter.sample(clock_high, direction_high, now_ms);

        self.apply.update(now_ms);
        if !self.apply.clicked() {
            return None;
        }
        self.apply.clear_state();
        self.applied = self.counter.value();
        Some(self.applied)
    }

    /// Position shown to the user, not yet applied
    pub fn pending(&self) -> u8 {
        self.counter.value()
    }
}

impl<P: InputPin> SelectorInput for EncoderSelector<P> {
    fn read(&self) -> u8 {
        self.applied
    }
}
