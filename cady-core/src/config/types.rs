//! Configuration type definitions
//!
//! Every field has a default equal to the board's stock wiring and timing,
//! so an empty configuration is a working one.

use crate::heartbeat::{HEARTBEAT_PERIOD_MS, MAX_STALE_CHECKS};
use crate::shared::LOCK_WAIT_MS;

/// Maximum number of DIP selector pins
pub const MAX_SELECTOR_PINS: usize = 8;

/// Serial link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModbusConfig {
    /// Slave address answered by the MCU
    pub slave_address: u8,
    /// Line rate (8N1)
    pub baud_rate: u32,
    /// Serial read timeout per poll cycle
    pub read_timeout_ms: u32,
    /// Silence that terminates a frame
    pub inter_frame_gap_ms: u32,
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            slave_address: cady_protocol::map::SLAVE_ADDRESS,
            baud_rate: cady_protocol::map::BAUD_RATE,
            read_timeout_ms: 5,
            inter_frame_gap_ms: cady_protocol::INTER_FRAME_GAP_MS,
        }
    }
}

/// Heartbeat supervision configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeartbeatConfig {
    /// Period between checks
    pub period_ms: u32,
    /// Stale checks before disconnect
    pub max_retries: u8,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            period_ms: HEARTBEAT_PERIOD_MS,
            max_retries: MAX_STALE_CHECKS,
        }
    }
}

/// Lifecycle timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LifecycleConfig {
    /// Poll task period
    pub poll_interval_ms: u32,
    /// Longest wait for the first heartbeat after power-on
    pub boot_timeout_ms: u32,
    /// Grace period between shutdown request and power-off
    pub shutdown_duration_ms: u32,
    /// Bounded wait for the shared store lock
    pub lock_wait_ms: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20,
            boot_timeout_ms: 120_000,
            shutdown_duration_ms: 30_000,
            lock_wait_ms: LOCK_WAIT_MS,
        }
    }
}

/// Output polarity of the switched power rails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerConfig {
    /// SBC power switch is on when the pin is low
    pub sbc_active_low: bool,
    /// Joystick power switches are on when the pin is low
    pub joy_active_low: bool,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            sbc_active_low: true,
            joy_active_low: true,
        }
    }
}

/// Power button configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonConfig {
    /// Pressed when the pin is low
    pub active_low: bool,
    /// Longest hold that still counts as a click
    pub click_timeout_ms: u32,
    /// Hold time that raises the long-press level
    pub long_press_ms: u32,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            active_low: true,
            click_timeout_ms: 500,
            long_press_ms: 3000,
        }
    }
}

/// Game selector hardware variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectorKind {
    /// Rotary encoder, value latched by the apply button
    #[default]
    Encoder,
    /// DIP switch bank read as a binary number
    Dip,
}

/// Game selector configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelectorConfig {
    /// Hardware variant
    pub kind: SelectorKind,
    /// Number of selectable slots for the encoder
    pub slots: u8,
    /// Encoder debounce window
    pub debounce_ms: u32,
    /// Reverse encoder direction
    pub invert_direction: bool,
    /// DIP switches read as on when the pin is low
    pub invert_inputs: bool,
    /// Number of DIP pins wired
    pub dip_pins: u8,
    /// Apply button pressed when the pin is low
    pub apply_active_low: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            kind: SelectorKind::Encoder,
            slots: 16,
            debounce_ms: 10,
            invert_direction: true,
            invert_inputs: true,
            dip_pins: 4,
            apply_active_low: true,
        }
    }
}

impl SelectorConfig {
    /// Highest selectable value for the encoder
    pub fn max_value(&self) -> u8 {
        self.slots.saturating_sub(1)
    }
}

/// Display supervisor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    /// Display task period
    pub interval_ms: u32,
    /// Detector reads low when the display is lit
    pub detect_inverted: bool,
    /// Control button is pressed by driving the pin low
    pub control_inverted: bool,
    /// Window in which an "off" reading must be seen
    pub disable_check_ms: u32,
    /// Length of a simulated button press
    pub press_ms: u32,
    /// Settling time after a press
    pub transition_ms: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            detect_inverted: true,
            control_inverted: false,
            disable_check_ms: 2000,
            press_ms: 400,
            transition_ms: 2000,
        }
    }
}

/// Joystick light configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightsConfig {
    /// Software PWM tick period
    pub pwm_tick_us: u32,
    /// Ramp speed of the normal blink, per mille of a step per ms
    pub blink_permille: u32,
    /// Ramp speed of the fast blink, per mille of a step per ms
    pub fast_blink_permille: u32,
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            pwm_tick_us: 40,
            blink_permille: 100,
            fast_blink_permille: 750,
        }
    }
}

/// Complete board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    pub modbus: ModbusConfig,
    pub heartbeat: HeartbeatConfig,
    pub lifecycle: LifecycleConfig,
    pub power: PowerConfig,
    pub button: ButtonConfig,
    pub selector: SelectorConfig,
    pub display: DisplayConfig,
    pub lights: LightsConfig,
}

impl BoardConfig {
    /// Create the stock configuration
    pub fn new() -> Self {
        Self::default()
    }
}
