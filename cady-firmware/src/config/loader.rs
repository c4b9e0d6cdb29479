//! Embedded board configuration
//!
//! Parses the board.toml embedded at build time. The build script has
//! already validated it, so a parse failure here means the on-target parser
//! and the build-time check disagree; the firmware then runs on defaults.

use defmt::*;

use cady_core::config::{parse_config, BoardConfig, SelectorKind};

/// Embedded configuration (compiled into firmware)
/// Edit board.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../board.toml");

/// Load the embedded configuration, falling back to defaults
pub fn load_config() -> BoardConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            warn!("Using default board configuration");
            BoardConfig::default()
        }
    }
}

/// Log the settings that matter when reading a field log
pub fn log_config_summary(config: &BoardConfig) {
    info!(
        "Modbus: slave {} @ {} baud, read timeout {}ms",
        config.modbus.slave_address, config.modbus.baud_rate, config.modbus.read_timeout_ms
    );
    info!(
        "Heartbeat: every {}ms, lost after {} stale checks",
        config.heartbeat.period_ms, config.heartbeat.max_retries
    );
    info!(
        "Lifecycle: poll {}ms, boot timeout {}ms, shutdown {}ms",
        config.lifecycle.poll_interval_ms,
        config.lifecycle.boot_timeout_ms,
        config.lifecycle.shutdown_duration_ms
    );
    match config.selector.kind {
        SelectorKind::Encoder => info!("Selector: encoder, {} slots", config.selector.slots),
        SelectorKind::Dip => info!("Selector: DIP, {} pins", config.selector.dip_pins),
    }
}
