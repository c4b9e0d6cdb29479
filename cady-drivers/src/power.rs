//! Power rail switch
//!
//! One GPIO enable line per rail (SBC, joystick 1, joystick 2). Boards wire
//! the enables either straight or through an active-low driver, so the
//! polarity comes from the `[power]` config section.

use cady_core::traits::PowerOutput;
use cady_hal::OutputPin;

/// Rail enable on a GPIO pin; starts switched off
pub struct PowerSwitch<P> {
    pin: P,
    active_low: bool,
}

impl<P: OutputPin> PowerSwitch<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut switch = Self { pin, active_low };
        switch.off();
        switch
    }
}

impl<P: OutputPin> PowerOutput for PowerSwitch<P> {
    fn on(&mut self) {
        self.pin.set_state(!self.active_low);
    }

    fn off(&mut self) {
        self.pin.set_state(self.active_low);
    }

    fn is_on(&self) -> bool {
        self.pin.is_set_high() != self.active_low
    }
}
