//! Cady Hardware Abstraction Layer
//!
//! This crate defines the pin traits the supervisor drivers are written
//! against. They are infallible: a supervisor cannot recover from a failed
//! GPIO write, so chip errors are dropped at the adapter boundary.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  cady-drivers (button, power, selector) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cady-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  embedded-hal 1.0 pins (embassy-rp)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`gpio::HalPin`] - adapter from any `embedded-hal` digital pin

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;

pub use gpio::{HalPin, InputPin, OutputPin};
