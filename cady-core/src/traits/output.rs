//! Output collaborator traits

/// Trait for a switched power rail (SBC or joystick)
pub trait PowerOutput {
    /// Switch the rail on
    fn on(&mut self);

    /// Switch the rail off
    fn off(&mut self);

    /// Check if the rail is on
    fn is_on(&self) -> bool;

    /// Switch to the given state
    fn set(&mut self, on: bool) {
        if on {
            self.on();
        } else {
            self.off();
        }
    }
}

/// LED effects shown on the joystick lights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LightEffect {
    /// Both channels dark
    Off,
    /// Both channels ramp together
    Blinking,
    /// Brightness set by the SBC
    Manual,
    /// Channels ramp in opposite phase
    AlternatingBlinking,
    /// Fast ramp on both channels
    FastBlinking,
}

/// Trait for the light effect generator
pub trait LightEffectController {
    /// Select the active effect
    fn set_effect(&mut self, effect: LightEffect);

    /// Brightness pair used by [`LightEffect::Manual`]
    fn set_manual_brightness(&mut self, joy1: u8, joy2: u8);

    /// Currently active effect
    fn effect(&self) -> LightEffect;
}

/// Trait for the display force-off override
pub trait DisplayForceOff {
    /// Keep the display off regardless of the SBC request
    fn force(&mut self);

    /// Let the SBC request decide again
    fn release(&mut self);

    /// Check if the override is active
    fn is_forced(&self) -> bool;
}

/// Force-off override stored as a flag
///
/// The display supervisor runs in another task, so the poll task publishes
/// this flag through the shared store every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ForceOffLatch {
    forced: bool,
}

impl ForceOffLatch {
    /// Create a released latch
    pub const fn new() -> Self {
        Self { forced: false }
    }
}

impl DisplayForceOff for ForceOffLatch {
    fn force(&mut self) {
        self.forced = true;
    }

    fn release(&mut self) {
        self.forced = false;
    }

    fn is_forced(&self) -> bool {
        self.forced
    }
}
