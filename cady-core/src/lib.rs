//! Board-agnostic core logic for the SBC power supervisor
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Lifecycle state machine and its controller
//! - Heartbeat liveness monitoring
//! - Shared state store between the poll and display tasks
//! - Register transport between the store and the Modbus bank
//! - Collaborator traits (button, power, lights, display, selector)
//! - Board configuration types and parser

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod heartbeat;
pub mod lifecycle;
pub mod shared;
pub mod state;
pub mod traits;
pub mod transport;
