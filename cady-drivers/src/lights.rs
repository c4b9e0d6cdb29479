//! Joystick light effects
//!
//! Generates the brightness of the two joystick LEDs. Automatic effects
//! share one triangle ramp between 0 and 255 whose speed scales with the
//! time since the previous update. The ramp is kept in thousandths of a
//! brightness step so slow effects still advance on short poll periods.

use cady_core::config::LightsConfig;
use cady_core::traits::{LightEffect, LightEffectController};

/// Ramp ceiling in thousandths of a step
const RAMP_MAX: u32 = 255 * 1000;

/// Effect generator for the two joystick LEDs
#[derive(Debug, Clone)]
pub struct LightEffects {
    effect: LightEffect,
    manual: (u8, u8),
    blink_permille: u32,
    fast_blink_permille: u32,
    /// Ramp position in thousandths of a step
    ramp: u32,
    falling: bool,
    last_ms: Option<u32>,
    output: (u8, u8),
}

impl LightEffects {
    /// Create a generator showing [`LightEffect::Off`]
    pub fn new(config: &LightsConfig) -> Self {
        Self {
            effect: LightEffect::Off,
            manual: (0, 0),
            blink_permille: config.blink_permille,
            fast_blink_permille: config.fast_blink_permille,
            ramp: 0,
            falling: false,
            last_ms: None,
            output: (0, 0),
        }
    }

    /// Advance the effect to `now_ms` and return the (joy1, joy2) duties
    ///
    /// The first call only records the time. Calls with no elapsed time
    /// repeat the previous output.
    pub fn update(&mut self, now_ms: u32) -> (u8, u8) {
        let Some(last) = self.last_ms else {
            self.last_ms = Some(now_ms);
            return self.output;
        };

        let delta = now_ms.wrapping_sub(last);
        if delta == 0 {
            return self.output;
        }

        self.output = match self.effect {
            LightEffect::Off => (0, 0),
            LightEffect::Manual => self.manual,
            LightEffect::Blinking => {
                let level = self.advance(delta, self.blink_permille);
                (level, level)
            }
            LightEffect::AlternatingBlinking => {
                let level = self.advance(delta, self.blink_permille);
                (level, u8::MAX - level)
            }
            LightEffect::FastBlinking => {
                let level = self.advance(delta, self.fast_blink_permille);
                (level, level)
            }
        };

        self.last_ms = Some(now_ms);
        self.output
    }

    fn advance(&mut self, delta_ms: u32, permille: u32) -> u8 {
        let step = delta_ms.saturating_mul(permille);

        if self.falling {
            self.ramp = self.ramp.saturating_sub(step);
            if self.ramp == 0 {
                self.falling = false;
            }
        } else {
            self.ramp = self.ramp.saturating_add(step).min(RAMP_MAX);
            if self.ramp == RAMP_MAX {
                self.falling = true;
            }
        }

        (self.ramp / 1000) as u8
    }
}

impl LightEffectController for LightEffects {
    fn set_effect(&mut self, effect: LightEffect) {
        self.effect = effect;
    }

    fn set_manual_brightness(&mut self, joy1: u8, joy2: u8) {
        self.manual = (joy1, joy2);
    }

    fn effect(&self) -> LightEffect {
        self.effect
    }
}
