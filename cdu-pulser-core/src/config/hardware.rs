//! Relay board configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Channels on a 16-bit port expander board
pub const RELAY16_CHANNELS: u8 = 16;

/// Base 7-bit address of MCP23017-style expanders (all jumpers open)
pub const RELAY16_BASE_ADDRESS: u8 = 0x20;

/// Relays wired straight to MCU pins (GPIO6..GPIO13 on the RP2040 board)
pub const MAX_GPIO_CHANNELS: u8 = 8;

/// Relay board type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoardKind {
    /// 16-relay board behind an I2C port expander
    #[default]
    Relay16,
    /// Relays wired straight to MCU pins
    Gpio,
}

/// Relay board hardware configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoardConfig {
    /// Board type
    pub kind: BoardKind,
    /// 7-bit I2C address (Relay16 only)
    pub i2c_address: u8,
    /// Number of relay channels in use
    pub channels: u8,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            kind: BoardKind::Relay16,
            i2c_address: RELAY16_BASE_ADDRESS,
            channels: RELAY16_CHANNELS,
        }
    }
}

impl BoardConfig {
    /// Relay16 board addressed by its three jumpers (A2, A1, A0)
    pub const fn relay16(a2: bool, a1: bool, a0: bool) -> Self {
        let jumpers = ((a2 as u8) << 2) | ((a1 as u8) << 1) | (a0 as u8);
        Self {
            kind: BoardKind::Relay16,
            i2c_address: RELAY16_BASE_ADDRESS | jumpers,
            channels: RELAY16_CHANNELS,
        }
    }

    /// Check address and channel count against the board type
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.kind {
            BoardKind::Relay16 => {
                if self.i2c_address & !0x07 != RELAY16_BASE_ADDRESS {
                    return Err(ConfigError::InvalidAddress);
                }
                if self.channels == 0 || self.channels > RELAY16_CHANNELS {
                    return Err(ConfigError::InvalidChannelCount);
                }
            }
            BoardKind::Gpio => {
                if self.channels == 0 || self.channels > MAX_GPIO_CHANNELS {
                    return Err(ConfigError::InvalidChannelCount);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay16_jumper_address() {
        assert_eq!(BoardConfig::relay16(false, false, false).i2c_address, 0x20);
        assert_eq!(BoardConfig::relay16(true, false, true).i2c_address, 0x25);
        assert_eq!(BoardConfig::relay16(true, true, true).i2c_address, 0x27);
    }

    #[test]
    fn test_relay16_address_range() {
        let mut board = BoardConfig::default();
        assert!(board.validate().is_ok());

        board.i2c_address = 0x28;
        assert_eq!(board.validate(), Err(ConfigError::InvalidAddress));
    }

    #[test]
    fn test_channel_limits() {
        let mut board = BoardConfig {
            kind: BoardKind::Gpio,
            i2c_address: 0,
            channels: 0,
        };
        assert_eq!(board.validate(), Err(ConfigError::InvalidChannelCount));

        board.channels = 4;
        assert!(board.validate().is_ok());

        board.channels = MAX_GPIO_CHANNELS;
        assert!(board.validate().is_ok());
        board.channels = MAX_GPIO_CHANNELS + 1;
        assert_eq!(board.validate(), Err(ConfigError::InvalidChannelCount));

        board.kind = BoardKind::Relay16;
        board.i2c_address = 0x21;
        board.channels = 17;
        assert_eq!(board.validate(), Err(ConfigError::InvalidChannelCount));
    }
}
