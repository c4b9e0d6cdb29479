//! Display supervisor
//!
//! The display has a single momentary power key and a status LED. The
//! supervisor compares the wanted power state with the LED and decides when
//! the key must be pressed. Turning on happens as soon as the LED reads off.
//! Turning off only happens when the LED reads on for a whole check window,
//! since the LED can blink while the display is going to standby.
//!
//! The supervisor is pure: the display task reads the pins, calls
//! [`DisplaySupervisor::update`] and performs the returned action.

use cady_core::config::DisplayConfig;

/// What the display task should do after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayAction {
    /// Nothing to do
    Idle,
    /// Press the power key for the press duration
    Press {
        /// Press meant to switch the display on
        turning_on: bool,
    },
}

/// Decision logic for the display power key
#[derive(Debug, Clone)]
pub struct DisplaySupervisor {
    config: DisplayConfig,
    /// Start of the current "still on" window while the display should be off
    off_window_from: Option<u32>,
    /// Time of the last press; no decisions until the display settled
    pressed_at: Option<u32>,
}

impl DisplaySupervisor {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            config: *config,
            off_window_from: None,
            pressed_at: None,
        }
    }

    /// Convert the detector pin level to "display lit"
    pub fn detected_on(&self, pin_high: bool) -> bool {
        pin_high != self.config.detect_inverted
    }

    /// Pin level that presses (`true`) or releases (`false`) the power key
    pub fn control_level(&self, pressed: bool) -> bool {
        pressed != self.config.control_inverted
    }

    /// Whether a press is still settling at `now_ms`
    pub fn settling(&self, now_ms: u32) -> bool {
        match self.pressed_at {
            Some(at) => {
                let settle = self.config.press_ms.saturating_add(self.config.transition_ms);
                now_ms.wrapping_sub(at) < settle
            }
            None => false,
        }
    }

    /// Decide the next action
    ///
    /// `want_on` is the SBC request with the force-off override applied.
    pub fn update(&mut self, want_on: bool, detected_on: bool, now_ms: u32) -> DisplayAction {
        if self.settling(now_ms) {
            return DisplayAction::Idle;
        }
        self.pressed_at = None;

        if want_on {
            self.off_window_from = None;
            if detected_on {
                return DisplayAction::Idle;
            }
            return self.press(now_ms, true);
        }

        if !detected_on {
            self.off_window_from = None;
            return DisplayAction::Idle;
        }

        match self.off_window_from {
            None => {
                self.off_window_from = Some(now_ms);
                DisplayAction::Idle
            }
            Some(from) if now_ms.wrapping_sub(from) >= self.config.disable_check_ms => {
                self.off_window_from = None;
                self.press(now_ms, false)
            }
            Some(_) => DisplayAction::Idle,
        }
    }

    fn press(&mut self, now_ms: u32, turning_on: bool) -> DisplayAction {
        self.pressed_at = Some(now_ms);
        DisplayAction::Press { turning_on }
    }
}

/// Wanted display power from the shared store flags
pub fn want_display_on(display_state: bool, force_off: bool) -> bool {
    display_state && !force_off
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: u32 = 400 + 2000;

    fn supervisor() -> DisplaySupervisor {
        DisplaySupervisor::new(&DisplayConfig::default())
    }

    #[test]
    fn test_turns_on_when_dark() {
        let mut sup = supervisor();
        assert_eq!(
            sup.update(true, false, 0),
            DisplayAction::Press { turning_on: true }
        );
    }

    #[test]
    fn test_no_press_while_settling() {
        let mut sup = supervisor();
        sup.update(true, false, 0);

        assert_eq!(sup.update(true, false, SETTLE - 100), DisplayAction::Idle);
        assert!(sup.settling(SETTLE - 1));
        assert_eq!(
            sup.update(true, false, SETTLE),
            DisplayAction::Press { turning_on: true }
        );
    }

    #[test]
    fn test_on_and_lit_is_idle() {
        let mut sup = supervisor();
        for now in (0..5000).step_by(100) {
            assert_eq!(sup.update(true, true, now), DisplayAction::Idle);
        }
    }

    #[test]
    fn test_turns_off_after_full_window_lit() {
        let mut sup = supervisor();
        let mut now = 0;
        while now < 2000 {
            assert_eq!(sup.update(false, true, now), DisplayAction::Idle);
            now += 100;
        }
        assert_eq!(
            sup.update(false, true, now),
            DisplayAction::Press { turning_on: false }
        );
    }

    #[test]
    fn test_single_off_reading_restarts_window() {
        let mut sup = supervisor();
        sup.update(false, true, 0);
        sup.update(false, true, 1900);
        // LED blinked off once
        assert_eq!(sup.update(false, false, 2000), DisplayAction::Idle);
        assert_eq!(sup.update(false, true, 2100), DisplayAction::Idle);
        assert_eq!(sup.update(false, true, 4000), DisplayAction::Idle);
        assert_eq!(
            sup.update(false, true, 4100),
            DisplayAction::Press { turning_on: false }
        );
    }

    #[test]
    fn test_want_change_resets_window() {
        let mut sup = supervisor();
        sup.update(false, true, 0);
        sup.update(true, true, 1000);
        assert_eq!(sup.update(false, true, 2000), DisplayAction::Idle);
    }

    #[test]
    fn test_polarity() {
        let sup = supervisor();
        // LED pulls the detector low when lit
        assert!(sup.detected_on(false));
        assert!(!sup.detected_on(true));
        assert!(sup.control_level(true));
        assert!(!sup.control_level(false));

        let inverted = DisplaySupervisor::new(&DisplayConfig {
            detect_inverted: false,
            control_inverted: true,
            ..DisplayConfig::default()
        });
        assert!(inverted.detected_on(true));
        assert!(!inverted.control_level(true));
    }

    #[test]
    fn test_force_off_overrides_request() {
        assert!(want_display_on(true, false));
        assert!(!want_display_on(true, true));
        assert!(!want_display_on(false, false));
    }
}
