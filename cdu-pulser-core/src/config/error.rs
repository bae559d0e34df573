//! Configuration errors

use core::fmt;

/// Reasons a configuration is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pulse on-duration of zero
    ZeroOnDuration,
    /// Recharge duration of zero
    ZeroRechargeDuration,
    /// Duration too long for wrap-safe deadline comparison
    DurationTooLong,
    /// Unknown or malformed `[section]` header
    InvalidSection,
    /// Key not recognised in the current section
    UnknownKey,
    /// Key set twice in the same section
    DuplicateKey,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Active level is neither "high" nor "low"
    InvalidLevel,
    /// Board I2C address or turnout address out of range
    InvalidAddress,
    /// More turnouts than the board has relay pairs
    TooManyTurnouts,
    /// Board channel count of zero or beyond the board's capability
    InvalidChannelCount,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::ZeroOnDuration => "on_ms must be greater than zero",
            ConfigError::ZeroRechargeDuration => "recharge_ms must be greater than zero",
            ConfigError::DurationTooLong => "duration exceeds the wrap-safe limit",
            ConfigError::InvalidSection => "invalid section header",
            ConfigError::UnknownKey => "unknown key",
            ConfigError::DuplicateKey => "key set more than once",
            ConfigError::InvalidValue => "invalid value",
            ConfigError::InvalidLevel => "active_level must be \"high\" or \"low\"",
            ConfigError::InvalidAddress => "address out of range",
            ConfigError::TooManyTurnouts => "more turnouts than relay pairs on the board",
            ConfigError::InvalidChannelCount => "invalid relay channel count",
        };
        f.write_str(msg)
    }
}
