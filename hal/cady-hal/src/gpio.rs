//! GPIO pin abstractions
//!
//! Provides traits for digital input and output pins, plus [`HalPin`], which
//! lifts any `embedded-hal` 1.0 pin into them.

use embedded_hal::digital::{InputPin as EhInputPin, StatefulOutputPin};

/// Digital output pin
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently driven high
    fn is_set_high(&self) -> bool;
}

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&mut self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }
}

/// Adapter from an `embedded-hal` pin to the Cady pin traits.
///
/// Errors reported by the wrapped pin are dropped. For inputs a failed read
/// counts as low; for outputs the last requested level is remembered so
/// [`OutputPin::is_set_high`] stays usable without `&mut` access.
pub struct HalPin<P> {
    pin: P,
    level: bool,
}

impl<P> HalPin<P> {
    /// Wrap a pin
    pub fn new(pin: P) -> Self {
        Self { pin, level: false }
    }

    /// Release the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: StatefulOutputPin> OutputPin for HalPin<P> {
    fn set_high(&mut self) {
        self.level = true;
        let _ = self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.level = false;
        let _ = self.pin.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.level
    }
}

impl<P: EhInputPin> InputPin for HalPin<P> {
    fn is_high(&mut self) -> bool {
        self.pin.is_high().unwrap_or(false)
    }
}
