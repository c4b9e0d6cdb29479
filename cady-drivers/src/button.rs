//! Front-panel button
//!
//! Polled GPIO button. Raises a latched click on a short press-release and
//! a latched long-press while held past the threshold.

use cady_core::config::ButtonConfig;
use cady_core::traits::ButtonInput;
use cady_hal::InputPin;

/// Polled push button
pub struct Button<P> {
    pin: P,
    active_low: bool,
    click_timeout_ms: u32,
    long_press_ms: u32,
    /// Level seen by the last update; `None` until the first sample
    previous: Option<bool>,
    pressed_at_ms: u32,
    clicked: bool,
    long_pressed: bool,
}

impl<P: InputPin> Button<P> {
    /// Create a button from its configuration
    pub fn new(pin: P, config: &ButtonConfig) -> Self {
        Self {
            pin,
            active_low: config.active_low,
            click_timeout_ms: config.click_timeout_ms,
            long_press_ms: config.long_press_ms,
            previous: None,
            pressed_at_ms: 0,
            clicked: false,
            long_pressed: false,
        }
    }

    fn sample(&mut self) -> bool {
        self.pin.is_high() != self.active_low
    }

    /// Sample the pin; call every poll cycle
    ///
    /// The first call only records the level and never raises an event.
    pub fn update(&mut self, now_ms: u32) {
        let pressed = self.sample();

        let Some(previous) = self.previous else {
            self.previous = Some(pressed);
            return;
        };

        if pressed != previous {
            if pressed {
                self.pressed_at_ms = now_ms;
            } else if now_ms.wrapping_sub(self.pressed_at_ms) <= self.click_timeout_ms {
                self.clicked = true;
            }
            self.previous = Some(pressed);
        } else if pressed && now_ms.wrapping_sub(self.pressed_at_ms) >= self.long_press_ms {
            self.long_pressed = true;
        }
    }
}

impl<P: InputPin> ButtonInput for Button<P> {
    fn pressed(&self) -> bool {
        self.previous.unwrap_or(false)
    }

    fn clicked(&self) -> bool {
        self.clicked
    }

    fn long_pressed(&self) -> bool {
        self.long_pressed
    }

    fn clear_state(&mut self) {
        self.clicked = false;
        self.long_pressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockPin {
        high: bool,
    }

    impl InputPin for MockPin {
        fn is_high(&mut self) -> bool {
            self.high
        }
    }

    /// Active-low button idling released
    fn button() -> Button<MockPin> {
        let mut button = Button::new(MockPin { high: true }, &ButtonConfig::default());
        button.update(0);
        button
    }

    fn press(button: &mut Button<MockPin>, now_ms: u32) {
        button.pin.high = false;
        button.update(now_ms);
    }

    fn release(button: &mut Button<MockPin>, now_ms: u32) {
        button.pin.high = true;
        button.update(now_ms);
    }

    #[test]
    fn test_short_press_clicks() {
        let mut button = button();
        press(&mut button, 100);
        assert!(button.pressed());
        assert!(!button.clicked());

        release(&mut button, 600);
        assert!(button.clicked());
        assert!(!button.long_pressed());
    }

    #[test]
    fn test_slow_release_is_not_click() {
        let mut button = button();
        press(&mut button, 100);
        release(&mut button, 601);
        assert!(!button.clicked());
    }

    #[test]
    fn test_long_press_latched_while_held() {
        let mut button = button();
        press(&mut button, 0);

        button.update(2999);
        assert!(!button.long_pressed());

        button.update(3000);
        assert!(button.long_pressed());

        button.clear_state();
        assert!(!button.long_pressed());

        // Raised again on every update while still held
        button.update(3020);
        assert!(button.long_pressed());

        release(&mut button, 3040);
        button.clear_state();
        button.update(3060);
        assert!(!button.long_pressed());
        assert!(!button.clicked());
    }

    #[test]
    fn test_first_update_only_samples() {
        let mut button = Button::new(MockPin { high: false }, &ButtonConfig::default());
        button.update(5000);
        assert!(button.pressed());
        assert!(!button.clicked());
        assert!(!button.long_pressed());
    }

    #[test]
    fn test_clear_state_clears_click() {
        let mut button = button();
        press(&mut button, 10);
        release(&mut button, 20);
        assert!(button.clicked());

        button.clear_state();
        assert!(!button.clicked());
    }

    #[test]
    fn test_active_high_button() {
        let config = ButtonConfig {
            active_low: false,
            ..ButtonConfig::default()
        };
        let mut button = Button::new(MockPin { high: false }, &config);
        button.update(0);
        assert!(!button.pressed());

        button.pin.high = true;
        button.update(10);
        assert!(button.pressed());
    }
}
