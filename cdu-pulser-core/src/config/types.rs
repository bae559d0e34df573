//! Pulse timing configuration

use crate::time::MAX_INTERVAL_MS;
use crate::traits::Level;

use super::error::ConfigError;
use super::hardware::BoardConfig;
use crate::turnout::TurnoutMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default pulse width (ms)
pub const DEFAULT_ON_MS: u32 = 100;

/// Default CDU recharge interval (ms)
pub const DEFAULT_RECHARGE_MS: u32 = 500;

/// Pulse timing and polarity
///
/// Validated on construction and immutable afterwards, so the sequencer never
/// sees a zero-length pulse or a deadline it cannot compare safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPulserConfig", into = "RawPulserConfig"))]
pub struct PulserConfig {
    on_ms: u32,
    recharge_ms: u32,
    active_level: Level,
}

impl PulserConfig {
    /// Create a validated configuration
    ///
    /// # Arguments
    /// - `on_ms`: How long each relay stays energized
    /// - `recharge_ms`: Minimum gap between releasing one relay and energizing the next
    /// - `active_level`: Logic level that energizes a relay on this board
    pub const fn new(on_ms: u32, recharge_ms: u32, active_level: Level) -> Result<Self, ConfigError> {
        if on_ms == 0 {
            return Err(ConfigError::ZeroOnDuration);
        }
        if recharge_ms == 0 {
            return Err(ConfigError::ZeroRechargeDuration);
        }
        if on_ms > MAX_INTERVAL_MS || recharge_ms > MAX_INTERVAL_MS {
            return Err(ConfigError::DurationTooLong);
        }
        Ok(Self {
            on_ms,
            recharge_ms,
            active_level,
        })
    }

    /// Pulse width (ms)
    pub const fn on_ms(&self) -> u32 {
        self.on_ms
    }

    /// Recharge interval (ms)
    pub const fn recharge_ms(&self) -> u32 {
        self.recharge_ms
    }

    /// Level that energizes a relay
    pub const fn active_level(&self) -> Level {
        self.active_level
    }

    /// Level that releases a relay
    pub const fn inactive_level(&self) -> Level {
        self.active_level.inverse()
    }
}

impl Default for PulserConfig {
    fn default() -> Self {
        Self {
            on_ms: DEFAULT_ON_MS,
            recharge_ms: DEFAULT_RECHARGE_MS,
            active_level: Level::High,
        }
    }
}

/// Unvalidated wire form of [`PulserConfig`]
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct RawPulserConfig {
    on_ms: u32,
    recharge_ms: u32,
    active_level: Level,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPulserConfig> for PulserConfig {
    type Error = ConfigError;

    fn try_from(raw: RawPulserConfig) -> Result<Self, Self::Error> {
        PulserConfig::new(raw.on_ms, raw.recharge_ms, raw.active_level)
    }
}

#[cfg(feature = "serde")]
impl From<PulserConfig> for RawPulserConfig {
    fn from(config: PulserConfig) -> Self {
        Self {
            on_ms: config.on_ms,
            recharge_ms: config.recharge_ms,
            active_level: config.active_level,
        }
    }
}

/// Complete decoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PulserSettings {
    /// Pulse timing and polarity
    pub pulser: PulserConfig,
    /// Relay board selection
    pub board: BoardConfig,
    /// Accessory address to relay mapping
    pub turnouts: TurnoutMap,
}

impl PulserSettings {
    /// Cross-check sections against each other
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.board.validate()?;
        self.turnouts.validate()?;
        if self.turnouts.relays_needed() > u16::from(self.board.channels) {
            return Err(ConfigError::TooManyTurnouts);
        }
        Ok(())
    }
}
