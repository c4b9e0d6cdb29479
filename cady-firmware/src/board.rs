//! Board wiring
//!
//! | GPIO      | function                              |
//! |-----------|---------------------------------------|
//! | 0, 1      | UART0 TX/RX to the SBC (Modbus RTU)   |
//! | 2         | SBC power enable                      |
//! | 3         | front-panel power button              |
//! | 4         | display power key (simulated press)   |
//! | 5         | display status LED detector           |
//! | 6, 7      | joystick 1/2 LED (software PWM)       |
//! | 8, 9      | joystick 1/2 power enable             |
//! | 10        | game selector apply button            |
//! | 11, 12    | encoder clock / direction             |
//! | 13-16     | DIP selector bits 0-3                 |

use embassy_rp::gpio::{Input, Output};
use embassy_rp::uart::BufferedUart;

use cady_drivers::{AnySelector, Button, PowerSwitch};
use cady_hal::HalPin;

/// Number of software PWM channels (one per joystick LED)
pub const LIGHT_CHANNELS: usize = 2;

/// DIP selector bits wired on this board
pub const DIP_PINS: usize = 4;

/// Output pin usable by the drivers
pub type OutPin = HalPin<Output<'static>>;

/// Input pin usable by the drivers
pub type InPin = HalPin<Input<'static>>;

/// Power rail switch
pub type Switch = PowerSwitch<OutPin>;

/// Hardware owned by the poll task
pub struct PollResources {
    pub uart: BufferedUart,
    pub sbc: Switch,
    pub joy1: Switch,
    pub joy2: Switch,
    pub button: Button<InPin>,
    pub selector: AnySelector<InPin>,
}

/// Hardware owned by the display task
pub struct DisplayResources {
    pub control: Output<'static>,
    pub detect: Input<'static>,
}

/// Hardware owned by the PWM task
pub struct LightResources {
    pub leds: [Output<'static>; LIGHT_CHANNELS],
}
