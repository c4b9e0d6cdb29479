//! Collaborator implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in cady-core on top of the cady-hal pin traits:
//!
//! - Front-panel button with click and long-press detection
//! - Power switches for the SBC and joystick rails
//! - Software PWM and the joystick light effects driven through it
//! - Game selectors (rotary encoder, DIP switch bank)
//! - Display supervisor deciding when to press the display's power key

#![no_std]
#![deny(unsafe_code)]

pub mod button;
pub mod display;
pub mod lights;
pub mod power;
pub mod pwm;
pub mod selector;

pub use button::Button;
pub use display::{want_display_on, DisplayAction, DisplaySupervisor};
pub use lights::LightEffects;
pub use power::PowerSwitch;
pub use pwm::{SoftPwm, SoftPwmDuties};
pub use selector::{AnySelector, DipSelector, EncoderSelector};
