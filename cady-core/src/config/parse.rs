//! Simple TOML parser for board configuration
//!
//! This is a minimal parser that handles only the subset needed for the
//! board file. It does NOT support the full TOML grammar and needs no
//! allocator.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] headers
//! - Comments (# ...)
//! - Underscore digit separators in integers (120_000)
//!
//! NOT supported:
//! - Arrays and tables inside values
//! - Multi-line strings
//! - Dotted keys

use super::types::{BoardConfig, SelectorKind, MAX_SELECTOR_PINS};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Key not known in its section
    UnknownKey,
    /// Line has no `=` or nothing after it
    MissingValue,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Modbus,
    Heartbeat,
    Lifecycle,
    Power,
    Button,
    Selector,
    Display,
    Lights,
}

/// Parse TOML text into a [`BoardConfig`]
///
/// Keys that are absent keep their defaults.
pub fn parse_config(input: &str) -> Result<BoardConfig, ParseError> {
    let mut config = BoardConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            if !line.ends_with(']') {
                return Err(ParseError::InvalidSection);
            }
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line)?;
        apply_value(&mut config, section, key, value)?;
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "modbus" => Ok(Section::Modbus),
        "heartbeat" => Ok(Section::Heartbeat),
        "lifecycle" => Ok(Section::Lifecycle),
        "power" => Ok(Section::Power),
        "button" => Ok(Section::Button),
        "selector" => Ok(Section::Selector),
        "display" => Ok(Section::Display),
        "lights" => Ok(Section::Lights),
        _ => Err(ParseError::InvalidSection),
    }
}

fn apply_value(
    config: &mut BoardConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Modbus, "slave_address") => {
            let address: u8 = parse_int(value)?;
            // 0 is broadcast, 248-255 are reserved
            if address == 0 || address > 247 {
                return Err(ParseError::InvalidValue);
            }
            config.modbus.slave_address = address;
        }
        (Section::Modbus, "baud_rate") => config.modbus.baud_rate = parse_nonzero(value)?,
        (Section::Modbus, "read_timeout_ms") => {
            config.modbus.read_timeout_ms = parse_nonzero(value)?
        }
        (Section::Modbus, "inter_frame_gap_ms") => {
            config.modbus.inter_frame_gap_ms = parse_nonzero(value)?
        }

        (Section::Heartbeat, "period_ms") => config.heartbeat.period_ms = parse_nonzero(value)?,
        (Section::Heartbeat, "max_retries") => {
            let retries: u8 = parse_int(value)?;
            if retries == 0 {
                return Err(ParseError::InvalidValue);
            }
            config.heartbeat.max_retries = retries;
        }

        (Section::Lifecycle, "poll_interval_ms") => {
            config.lifecycle.poll_interval_ms = parse_nonzero(value)?
        }
        (Section::Lifecycle, "boot_timeout_ms") => {
            config.lifecycle.boot_timeout_ms = parse_nonzero(value)?
        }
        (Section::Lifecycle, "shutdown_duration_ms") => {
            config.lifecycle.shutdown_duration_ms = parse_nonzero(value)?
        }
        (Section::Lifecycle, "lock_wait_ms") => {
            config.lifecycle.lock_wait_ms = parse_nonzero(value)?
        }

        (Section::Power, "sbc_active_low") => config.power.sbc_active_low = parse_bool(value)?,
        (Section::Power, "joy_active_low") => config.power.joy_active_low = parse_bool(value)?,

        (Section::Button, "active_low") => config.button.active_low = parse_bool(value)?,
        (Section::Button, "click_timeout_ms") => {
            config.button.click_timeout_ms = parse_nonzero(value)?
        }
        (Section::Button, "long_press_ms") => config.button.long_press_ms = parse_nonzero(value)?,

        (Section::Selector, "kind") => {
            config.selector.kind = match parse_string(value) {
                "encoder" => SelectorKind::Encoder,
                "dip" => SelectorKind::Dip,
                _ => return Err(ParseError::InvalidValue),
            }
        }
        (Section::Selector, "slots") => {
            let slots: u8 = parse_int(value)?;
            if slots == 0 {
                return Err(ParseError::InvalidValue);
            }
            config.selector.slots = slots;
        }
        (Section::Selector, "debounce_ms") => config.selector.debounce_ms = parse_int(value)?,
        (Section::Selector, "invert_direction") => {
            config.selector.invert_direction = parse_bool(value)?
        }
        (Section::Selector, "invert_inputs") => {
            config.selector.invert_inputs = parse_bool(value)?
        }
        (Section::Selector, "dip_pins") => {
            let pins: u8 = parse_int(value)?;
            if pins == 0 || pins as usize > MAX_SELECTOR_PINS {
                return Err(ParseError::InvalidValue);
            }
            config.selector.dip_pins = pins;
        }
        (Section::Selector, "apply_active_low") => {
            config.selector.apply_active_low = parse_bool(value)?
        }

        (Section::Display, "interval_ms") => config.display.interval_ms = parse_nonzero(value)?,
        (Section::Display, "detect_inverted") => {
            config.display.detect_inverted = parse_bool(value)?
        }
        (Section::Display, "control_inverted") => {
            config.display.control_inverted = parse_bool(value)?
        }
        (Section::Display, "disable_check_ms") => {
            config.display.disable_check_ms = parse_nonzero(value)?
        }
        (Section::Display, "press_ms") => config.display.press_ms = parse_nonzero(value)?,
        (Section::Display, "transition_ms") => config.display.transition_ms = parse_int(value)?,

        (Section::Lights, "pwm_tick_us") => config.lights.pwm_tick_us = parse_nonzero(value)?,
        (Section::Lights, "blink_permille") => {
            config.lights.blink_permille = parse_nonzero(value)?
        }
        (Section::Lights, "fast_blink_permille") => {
            config.lights.fast_blink_permille = parse_nonzero(value)?
        }

        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

/// Remove a trailing comment, ignoring `#` inside quotes
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Split `key = value`
fn parse_key_value(line: &str) -> Result<(&str, &str), ParseError> {
    let eq_pos = line.find('=').ok_or(ParseError::MissingValue)?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() {
        return Err(ParseError::UnknownKey);
    }
    if value.is_empty() {
        return Err(ParseError::MissingValue);
    }

    Ok((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

/// Parse an integer value, allowing `_` separators
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    if !value.contains('_') {
        return value.parse().map_err(|_| ParseError::InvalidValue);
    }

    let mut digits = heapless::String::<20>::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a strictly positive u32
fn parse_nonzero(value: &str) -> Result<u32, ParseError> {
    match parse_int::<u32>(value)? {
        0 => Err(ParseError::InvalidValue),
        n => Ok(n),
    }
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}
