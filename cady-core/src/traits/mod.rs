//! Collaborator traits
//!
//! These traits define the interface between the lifecycle logic and the
//! I/O glue in the drivers crate.

pub mod input;
pub mod output;

pub use input::{ButtonInput, SelectorInput};
pub use output::{DisplayForceOff, ForceOffLatch, LightEffect, LightEffectController, PowerOutput};
