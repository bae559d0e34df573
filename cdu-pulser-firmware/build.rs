//! Build script for cdu-pulser-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates pulser.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Largest duration the wrap-safe deadline comparison can represent
const MAX_DURATION_MS: i64 = i32::MAX as i64;

/// Relays on a Relay16 board
const RELAY16_CHANNELS: i64 = 16;

/// Relays the firmware wires to GPIO6..GPIO13
const GPIO_CHANNELS: i64 = 8;

/// Highest accessory decoder address
const MAX_ACCESSORY_ADDRESS: i64 = 2044;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("cannot create memory.x");
    f.write_all(memory_x).expect("cannot write memory.x");

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate pulser.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=pulser.toml");

    let config_path = Path::new("pulser.toml");

    if !config_path.exists() {
        fail(
            "pulser.toml not found",
            &["The firmware embeds pulser.toml from the cdu-pulser-firmware directory.".into()],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read pulser.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in pulser.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();

    if let Some(table) = config.as_table() {
        for key in table.keys() {
            if !["pulser", "board", "turnouts"].contains(&key.as_str()) {
                errors.push(format!("unknown section [{}]", key));
            }
        }
    }

    validate_pulser(&config, &mut errors);
    let channels = validate_board(&config, &mut errors);
    validate_turnouts(&config, channels, &mut errors);

    if !errors.is_empty() {
        fail("Invalid configuration in pulser.toml", &errors);
    }

    println!("cargo:warning=pulser.toml validated successfully");
}

/// Validate the [pulser] section
fn validate_pulser(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(pulser) = section(config, "pulser", &["on_ms", "recharge_ms", "active_level"], errors)
    else {
        return;
    };

    for key in ["on_ms", "recharge_ms"] {
        match pulser.get(key) {
            Some(toml::Value::Integer(ms)) if *ms <= 0 => {
                errors.push(format!("[pulser] {} must be greater than zero", key));
            }
            Some(toml::Value::Integer(ms)) if *ms > MAX_DURATION_MS => {
                errors.push(format!("[pulser] {} must be at most {}", key, MAX_DURATION_MS));
            }
            Some(toml::Value::Integer(_)) | None => {}
            Some(_) => errors.push(format!("[pulser] {} must be an integer", key)),
        }
    }

    match pulser.get("active_level") {
        Some(toml::Value::String(level)) => {
            if !["high", "low"].contains(&level.to_ascii_lowercase().as_str()) {
                errors.push("[pulser] active_level must be 'high' or 'low'".into());
            }
        }
        Some(toml::Value::Integer(0 | 1)) | Some(toml::Value::Boolean(_)) | None => {}
        Some(_) => errors.push("[pulser] active_level must be 'high' or 'low'".into()),
    }
}

/// Validate the [board] section, returning its channel count
fn validate_board(config: &toml::Value, errors: &mut Vec<String>) -> i64 {
    let Some(board) = section(config, "board", &["kind", "i2c_address", "channels"], errors) else {
        return 16;
    };

    let kind = match board.get("kind") {
        Some(toml::Value::String(kind)) if kind == "relay16" || kind == "gpio" => kind.as_str(),
        Some(_) => {
            errors.push("[board] kind must be 'relay16' or 'gpio'".into());
            return 16;
        }
        None => "relay16",
    };

    let channels = match board.get("channels") {
        Some(toml::Value::Integer(n)) => *n,
        Some(_) => {
            errors.push("[board] channels must be an integer".into());
            16
        }
        None => 16,
    };
    let max_channels = if kind == "gpio" {
        GPIO_CHANNELS
    } else {
        RELAY16_CHANNELS
    };
    if !(1..=max_channels).contains(&channels) {
        errors.push(format!(
            "[board] channels must be 1-{} for kind '{}'",
            max_channels, kind
        ));
    }

    if kind == "relay16" {
        match board.get("i2c_address") {
            Some(toml::Value::Integer(addr)) if !(0x20..=0x27).contains(addr) => {
                errors.push("[board] i2c_address must be 0x20-0x27".into());
            }
            Some(toml::Value::Integer(_)) | None => {}
            Some(_) => errors.push("[board] i2c_address must be an integer".into()),
        }
    }

    channels
}

/// Validate the [turnouts] section against the board size
fn validate_turnouts(config: &toml::Value, channels: i64, errors: &mut Vec<String>) {
    let Some(turnouts) = section(config, "turnouts", &["base_address", "count"], errors) else {
        return;
    };

    let base = match turnouts.get("base_address") {
        Some(toml::Value::Integer(base)) => *base,
        Some(_) => {
            errors.push("[turnouts] base_address must be an integer".into());
            return;
        }
        None => 1,
    };
    let count = match turnouts.get("count") {
        Some(toml::Value::Integer(count)) => *count,
        Some(_) => {
            errors.push("[turnouts] count must be an integer".into());
            return;
        }
        None => 8,
    };

    if !(1..=MAX_ACCESSORY_ADDRESS).contains(&base) {
        errors.push(format!(
            "[turnouts] base_address must be 1-{}",
            MAX_ACCESSORY_ADDRESS
        ));
    }
    if count < 0 || base + count - 1 > MAX_ACCESSORY_ADDRESS {
        errors.push("[turnouts] count runs past the last accessory address".into());
    }
    if count * 2 > channels {
        errors.push(format!(
            "[turnouts] {} turnouts need {} relays, board has {}",
            count,
            count * 2,
            channels
        ));
    }
}

/// Look up a section and flag keys it does not define
fn section<'a>(
    config: &'a toml::Value,
    name: &str,
    keys: &[&str],
    errors: &mut Vec<String>,
) -> Option<&'a toml::Table> {
    match config.get(name) {
        Some(toml::Value::Table(table)) => {
            for key in table.keys() {
                if !keys.contains(&key.as_str()) {
                    errors.push(format!("[{}] unknown key '{}'", name, key));
                }
            }
            Some(table)
        }
        Some(_) => {
            errors.push(format!("[{}] must be a table", name));
            None
        }
        None => None,
    }
}

/// Abort the build with a boxed error report
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        lines
            .iter()
            .map(|line| {
                let truncated = if line.chars().count() > 62 {
                    format!("{}...", line.chars().take(59).collect::<String>())
                } else {
                    line.clone()
                };
                format!("║  • {:<62} ║", truncated)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}
