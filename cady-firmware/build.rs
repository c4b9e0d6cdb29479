//! Build script for cady-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates board.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Known sections and the keys each accepts
const SECTIONS: &[(&str, &[&str])] = &[
    (
        "modbus",
        &["slave_address", "baud_rate", "read_timeout_ms", "inter_frame_gap_ms"],
    ),
    ("heartbeat", &["period_ms", "max_retries"]),
    (
        "lifecycle",
        &[
            "poll_interval_ms",
            "boot_timeout_ms",
            "shutdown_duration_ms",
            "lock_wait_ms",
        ],
    ),
    ("power", &["sbc_active_low", "joy_active_low"]),
    ("button", &["active_low", "click_timeout_ms", "long_press_ms"]),
    (
        "selector",
        &[
            "kind",
            "slots",
            "debounce_ms",
            "invert_direction",
            "invert_inputs",
            "dip_pins",
            "apply_active_low",
        ],
    ),
    (
        "display",
        &[
            "interval_ms",
            "detect_inverted",
            "control_inverted",
            "disable_check_ms",
            "press_ms",
            "transition_ms",
        ],
    ),
    (
        "lights",
        &["pwm_tick_us", "blink_permille", "fast_blink_permille"],
    ),
];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate board.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds board.toml from the cady-firmware           ║\n\
            ║  directory. Restore it or create one with the board settings.    ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_layout(&config, &mut errors);
    validate_values(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid board configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=board.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check that only known sections and keys are present, with scalar values
fn validate_layout(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        errors.push("top level must be a table".to_string());
        return;
    };

    for (name, section) in root {
        let Some(keys) = SECTIONS.iter().find(|(s, _)| *s == name.as_str()).map(|(_, k)| *k) else {
            errors.push(format!("unknown section [{}]", name));
            continue;
        };

        let Some(table) = section.as_table() else {
            errors.push(format!("[{}] must be a table", name));
            continue;
        };

        for (key, value) in table {
            if !keys.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", name, key));
                continue;
            }
            match value {
                toml::Value::Integer(n) if *n < 0 || (*n == 0 && !allows_zero(key)) => {
                    errors.push(format!("[{}] {} must be positive", name, key));
                }
                toml::Value::Integer(n) if *n > u32::MAX as i64 => {
                    errors.push(format!("[{}] {} is too large", name, key));
                }
                toml::Value::Integer(_) | toml::Value::Boolean(_) | toml::Value::String(_) => {}
                _ => errors.push(format!("[{}] {} must be a number, bool or string", name, key)),
            }
        }
    }
}

/// Keys where zero is meaningful
fn allows_zero(key: &str) -> bool {
    matches!(key, "debounce_ms" | "transition_ms")
}

/// Range checks the on-target parser also enforces
fn validate_values(config: &toml::Value, errors: &mut Vec<String>) {
    let int = |section: &str, key: &str| {
        config
            .get(section)
            .and_then(|s| s.get(key))
            .and_then(|v| v.as_integer())
    };

    if let Some(address) = int("modbus", "slave_address") {
        if !(1..=247).contains(&address) {
            errors.push("[modbus] slave_address must be 1-247".to_string());
        }
    }

    if let Some(retries) = int("heartbeat", "max_retries") {
        if retries > 255 {
            errors.push("[heartbeat] max_retries must be 1-255".to_string());
        }
    }

    if let Some(slots) = int("selector", "slots") {
        if slots > 255 {
            errors.push("[selector] slots must be 1-255".to_string());
        }
    }

    if let Some(pins) = int("selector", "dip_pins") {
        if pins > 8 {
            errors.push("[selector] dip_pins must be 1-8".to_string());
        }
    }

    if let Some(kind) = config
        .get("selector")
        .and_then(|s| s.get("kind"))
        .and_then(|v| v.as_str())
    {
        if !["encoder", "dip"].contains(&kind) {
            errors.push("[selector] kind must be 'encoder' or 'dip'".to_string());
        }
    }

    let timeout = int("modbus", "read_timeout_ms").unwrap_or(5);
    let poll = int("lifecycle", "poll_interval_ms").unwrap_or(20);
    if timeout >= poll {
        errors.push("[modbus] read_timeout_ms must be below poll_interval_ms".to_string());
    }
}
