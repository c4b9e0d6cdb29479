//! Configuration types
//!
//! Board-agnostic configuration structures, filled from the firmware's
//! embedded `board.toml` by [`parse_config`].

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::*;
