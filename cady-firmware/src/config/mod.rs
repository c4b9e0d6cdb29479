//! Configuration loading
//!
//! The board configuration is compiled into the firmware from board.toml
//! and parsed once at startup by the no_std parser in cady-core.

pub mod loader;

pub use loader::{load_config, log_config_summary};
