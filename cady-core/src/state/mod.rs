//! Lifecycle state machine
//!
//! Defines the authoritative power sequencing of the companion SBC.
//! The state machine is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::TickEvents;
pub use machine::{AppState, ErrorKind};
