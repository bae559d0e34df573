//! `pulser.toml` parser
//!
//! A minimal line-oriented parser for the small TOML subset the decoder
//! configuration uses. It runs on-device without an allocator.
//!
//! Supported:
//! - `[pulser]`, `[board]` and `[turnouts]` section headers
//! - `key = value` pairs with integer (decimal or `0x` hex), boolean and
//!   double-quoted string values
//! - `#` comments, whole-line or trailing
//!
//! Anything else, including unknown keys, is rejected so that a typo in the
//! file cannot silently fall back to a default pulse width.

use core::fmt;

use super::error::ConfigError;
use super::hardware::{BoardConfig, BoardKind, MAX_GPIO_CHANNELS, RELAY16_CHANNELS};
use super::types::{PulserConfig, PulserSettings, DEFAULT_ON_MS, DEFAULT_RECHARGE_MS};
use crate::traits::Level;
use crate::turnout::TurnoutMap;

/// Configuration error with the line it was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError {
    /// 1-based line number, `None` for whole-file validation failures
    pub line: Option<usize>,
    /// What went wrong
    pub kind: ConfigError,
}

impl ParseError {
    fn at(line: usize, kind: ConfigError) -> Self {
        Self {
            line: Some(line),
            kind,
        }
    }

    fn global(kind: ConfigError) -> Self {
        Self { line: None, kind }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Pulser,
    Board,
    Turnouts,
}

/// Every key the file may set, in `(section, key)` order
const KEYS: [(Section, &str); 8] = [
    (Section::Pulser, "on_ms"),
    (Section::Pulser, "recharge_ms"),
    (Section::Pulser, "active_level"),
    (Section::Board, "kind"),
    (Section::Board, "i2c_address"),
    (Section::Board, "channels"),
    (Section::Turnouts, "base_address"),
    (Section::Turnouts, "count"),
];

/// Bit for `key` in a set of seen keys
fn key_bit(section: Section, key: &str) -> Option<u8> {
    KEYS.iter()
        .position(|&(s, k)| s == section && k == key)
        .map(|index| 1 << index)
}

impl Section {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "pulser" => Some(Section::Pulser),
            "board" => Some(Section::Board),
            "turnouts" => Some(Section::Turnouts),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value<'a> {
    Int(u32),
    Bool(bool),
    Str(&'a str),
}

impl<'a> Value<'a> {
    fn parse(s: &'a str) -> Option<Self> {
        if let Some(inner) = s.strip_prefix('"') {
            return inner.strip_suffix('"').map(Value::Str);
        }
        match s {
            "true" => return Some(Value::Bool(true)),
            "false" => return Some(Value::Bool(false)),
            _ => {}
        }
        let int = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => s.parse::<u32>().ok()?,
        };
        Some(Value::Int(int))
    }

    fn as_u32(self) -> Result<u32, ConfigError> {
        match self {
            Value::Int(v) => Ok(v),
            _ => Err(ConfigError::InvalidValue),
        }
    }

    fn as_u16(self) -> Result<u16, ConfigError> {
        u16::try_from(self.as_u32()?).map_err(|_| ConfigError::InvalidValue)
    }

    fn as_u8(self) -> Result<u8, ConfigError> {
        u8::try_from(self.as_u32()?).map_err(|_| ConfigError::InvalidValue)
    }

    fn as_str(self) -> Result<&'a str, ConfigError> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(ConfigError::InvalidValue),
        }
    }
}

/// Cut a trailing `#` comment that is not inside a string
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

fn parse_level(value: Value<'_>) -> Result<Level, ConfigError> {
    match value {
        Value::Str(s) if s.eq_ignore_ascii_case("high") => Ok(Level::High),
        Value::Str(s) if s.eq_ignore_ascii_case("low") => Ok(Level::Low),
        Value::Int(1) | Value::Bool(true) => Ok(Level::High),
        Value::Int(0) | Value::Bool(false) => Ok(Level::Low),
        _ => Err(ConfigError::InvalidLevel),
    }
}

fn parse_board_kind(value: Value<'_>) -> Result<BoardKind, ConfigError> {
    match value.as_str()? {
        "relay16" => Ok(BoardKind::Relay16),
        "gpio" => Ok(BoardKind::Gpio),
        _ => Err(ConfigError::InvalidValue),
    }
}

/// Parse and validate a complete decoder configuration
///
/// Keys that are absent keep their defaults from [`PulserSettings::default`].
pub fn parse_settings(input: &str) -> Result<PulserSettings, ParseError> {
    let mut section = Section::Root;

    let mut on_ms = DEFAULT_ON_MS;
    let mut recharge_ms = DEFAULT_RECHARGE_MS;
    let mut active_level = Level::High;
    let mut board = BoardConfig::default();
    let mut channels = None;
    let mut turnouts = TurnoutMap::default();
    let mut seen = 0u8;

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw).trim();

        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            section = header
                .strip_suffix(']')
                .and_then(|name| Section::from_name(name.trim()))
                .ok_or(ParseError::at(line_no, ConfigError::InvalidSection))?;
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or(ParseError::at(line_no, ConfigError::InvalidValue))?;
        let key = key.trim();
        let bit =
            key_bit(section, key).ok_or(ParseError::at(line_no, ConfigError::UnknownKey))?;
        if seen & bit != 0 {
            return Err(ParseError::at(line_no, ConfigError::DuplicateKey));
        }
        seen |= bit;

        let value = Value::parse(value.trim())
            .ok_or(ParseError::at(line_no, ConfigError::InvalidValue))?;

        let applied = match (section, key) {
            (Section::Pulser, "on_ms") => value.as_u32().map(|v| on_ms = v),
            (Section::Pulser, "recharge_ms") => value.as_u32().map(|v| recharge_ms = v),
            (Section::Pulser, "active_level") => parse_level(value).map(|v| active_level = v),
            (Section::Board, "kind") => parse_board_kind(value).map(|v| board.kind = v),
            (Section::Board, "i2c_address") => value.as_u8().map(|v| board.i2c_address = v),
            (Section::Board, "channels") => value.as_u8().map(|v| channels = Some(v)),
            (Section::Turnouts, "base_address") => {
                value.as_u16().map(|v| turnouts.base_address = v)
            }
            (Section::Turnouts, "count") => value.as_u8().map(|v| turnouts.count = v),
            _ => Err(ConfigError::UnknownKey),
        };
        applied.map_err(|kind| ParseError::at(line_no, kind))?;
    }

    // An unset channel count means the whole board
    board.channels = channels.unwrap_or(match board.kind {
        BoardKind::Relay16 => RELAY16_CHANNELS,
        BoardKind::Gpio => MAX_GPIO_CHANNELS,
    });

    let pulser =
        PulserConfig::new(on_ms, recharge_ms, active_level).map_err(ParseError::global)?;
    let settings = PulserSettings {
        pulser,
        board,
        turnouts,
    };
    settings.validate().map_err(ParseError::global)?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Decoder for the station throat
[pulser]
on_ms = 150
recharge_ms = 0x3E8   # 1000 ms
active_level = "low"

[board]
kind = "relay16"
i2c_address = 0x21
channels = 16

[turnouts]
base_address = 33
count = 6
"#;

    #[test]
    fn test_parse_full_file() {
        let settings = parse_settings(SAMPLE).unwrap();

        assert_eq!(settings.pulser.on_ms(), 150);
        assert_eq!(settings.pulser.recharge_ms(), 1000);
        assert_eq!(settings.pulser.active_level(), Level::Low);
        assert_eq!(settings.board.kind, BoardKind::Relay16);
        assert_eq!(settings.board.i2c_address, 0x21);
        assert_eq!(settings.turnouts, TurnoutMap::new(33, 6));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(parse_settings(""), Ok(PulserSettings::default()));
    }

    #[test]
    fn test_unknown_key_reports_line() {
        let err = parse_settings("[pulser]\non_ms = 100\npulse_ms = 5\n").unwrap_err();
        assert_eq!(err, ParseError::at(3, ConfigError::UnknownKey));
    }

    #[test]
    fn test_key_outside_section_rejected() {
        let err = parse_settings("on_ms = 100\n").unwrap_err();
        assert_eq!(err.kind, ConfigError::UnknownKey);
    }

    #[test]
    fn test_invalid_section() {
        let err = parse_settings("[pulser\n").unwrap_err();
        assert_eq!(err, ParseError::at(1, ConfigError::InvalidSection));

        let err = parse_settings("[heater]\n").unwrap_err();
        assert_eq!(err.kind, ConfigError::InvalidSection);
    }

    #[test]
    fn test_zero_duration_rejected_after_parse() {
        let err = parse_settings("[pulser]\nrecharge_ms = 0\n").unwrap_err();
        assert_eq!(err, ParseError::global(ConfigError::ZeroRechargeDuration));
    }

    #[test]
    fn test_bad_values() {
        let err = parse_settings("[pulser]\nactive_level = \"sideways\"\n").unwrap_err();
        assert_eq!(err.kind, ConfigError::InvalidLevel);

        let err = parse_settings("[board]\nchannels = 300\n").unwrap_err();
        assert_eq!(err.kind, ConfigError::InvalidValue);

        let err = parse_settings("[board]\nkind = relay16\n").unwrap_err();
        assert_eq!(err.kind, ConfigError::InvalidValue);
    }

    #[test]
    fn test_duplicate_key_reports_line() {
        let input = "[pulser]\non_ms = 100\nrecharge_ms = 500\non_ms = 250\n";
        let err = parse_settings(input).unwrap_err();
        assert_eq!(err, ParseError::at(4, ConfigError::DuplicateKey));

        // Reopening a section to set a different key is allowed
        assert!(parse_settings("[board]\nkind = \"relay16\"\n[board]\nchannels = 8\n").is_ok());
    }

    #[test]
    fn test_gpio_channel_default_and_limit() {
        let settings = parse_settings("[board]\nkind = \"gpio\"\n[turnouts]\ncount = 4\n").unwrap();
        assert_eq!(settings.board.channels, MAX_GPIO_CHANNELS);

        let input = "[board]\nkind = \"gpio\"\nchannels = 16\n[turnouts]\ncount = 8\n";
        let err = parse_settings(input).unwrap_err();
        assert_eq!(err, ParseError::global(ConfigError::InvalidChannelCount));
    }

    #[test]
    fn test_cross_section_validation() {
        let input = "[board]\nkind = \"gpio\"\nchannels = 4\n[turnouts]\ncount = 3\n";
        let err = parse_settings(input).unwrap_err();
        assert_eq!(err, ParseError::global(ConfigError::TooManyTurnouts));
    }

    #[test]
    fn test_hash_inside_string_kept() {
        assert_eq!(strip_comment("kind = \"a#b\" # note"), "kind = \"a#b\" ");
    }
}
