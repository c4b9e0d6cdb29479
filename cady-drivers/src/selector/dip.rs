//! DIP switch selector
//!
//! Reads a bank of switches as a little-endian binary number: the first pin
//! is bit 0.

use cady_core::config::{ButtonConfig, SelectorConfig, MAX_SELECTOR_PINS};
use cady_core::traits::{ButtonInput, SelectorInput};
use cady_hal::InputPin;
use heapless::Vec;

use crate::button::Button;

/// DIP switch selector with an apply button
pub struct DipSelector<P> {
    pins: Vec<P, MAX_SELECTOR_PINS>,
    apply: Button<P>,
    invert: bool,
    applied: u8,
}

impl<P: InputPin> DipSelector<P> {
    /// Create the selector and latch the switches' current value
    ///
    /// Pins beyond [`MAX_SELECTOR_PINS`] are ignored.
    pub fn new(pins: impl IntoIterator<Item = P>, apply: P, config: &SelectorConfig) -> Self {
        let apply_config = ButtonConfig {
            active_low: config.apply_active_low,
            ..ButtonConfig::default()
        };
        let mut selector = Self {
            pins: pins.into_iter().take(MAX_SELECTOR_PINS).collect(),
            apply: Button::new(apply, &apply_config),
            invert: config.invert_inputs,
            applied: 0,
        };
        selector.applied = selector.read_pins();
        selector
    }

    fn read_pins(&mut self) -> u8 {
        let invert = self.invert;
        self.pins
            .iter_mut()
            .enumerate()
            .fold(0, |value, (bit, pin)| {
                let on = pin.is_high() != invert;
                value | ((on as u8) << bit)
            })
    }

    /// Sample the apply button; re-reads the switches on a click
    pub fn update(&mut self, now_ms: u32) -> Option<u8> {
        self.apply.update(now_ms);
        if !self.apply.clicked() {
            return None;
        }
        self.apply.clear_state();
        self.applied = self.read_pins();
        Some(self.applied)
    }
}

impl<P: InputPin> SelectorInput for DipSelector<P> {
    fn read(&self) -> u8 {
        self.applied
    }
}
