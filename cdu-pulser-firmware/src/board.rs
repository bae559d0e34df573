//! Concrete relay board and clock for the RP2040 build
//!
//! The board type is picked from `pulser.toml` at startup, so the sequencer
//! task owns a [`Board`] that dispatches to whichever driver is fitted.

use cdu_pulser_core::config::MAX_GPIO_CHANNELS;
use cdu_pulser_core::time::Millis;
use cdu_pulser_core::traits::{Level, MonotonicClock, RelayId, RelayOutputs};
use cdu_pulser_drivers::relay::InvalidChannel;
use cdu_pulser_drivers::{GpioRelayBank, HalI2c, HalPin, Relay16, Relay16Error};
use embassy_rp::gpio::Output;
use embassy_rp::i2c::{self, Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::Instant;

/// Relays wired straight to GPIO6..GPIO13
pub const GPIO_CHANNELS: usize = MAX_GPIO_CHANNELS as usize;

/// I2C port-expander board on I2C0
pub type I2cRelayBoard = Relay16<HalI2c<I2c<'static, I2C0, Blocking>>>;

/// Directly driven relay bank
pub type GpioRelayBoard = GpioRelayBank<HalPin<Output<'static>>, GPIO_CHANNELS>;

/// Relay board write failure
#[derive(Debug, defmt::Format)]
pub enum BoardError {
    I2c(Relay16Error<i2c::Error>),
    Gpio(InvalidChannel),
}

/// The fitted relay board
pub enum Board {
    Relay16(I2cRelayBoard),
    Gpio {
        bank: GpioRelayBoard,
        /// Channels in use, at most [`GPIO_CHANNELS`]
        channels: u8,
    },
}

impl Board {
    /// Bring the board up with every relay at `inactive`
    pub fn init(&mut self, inactive: Level) -> Result<(), BoardError> {
        match self {
            Board::Relay16(board) => board.init(inactive).map_err(BoardError::I2c),
            Board::Gpio { bank, .. } => bank.set_all(inactive).map_err(BoardError::Gpio),
        }
    }
}

impl RelayOutputs for Board {
    type Error = BoardError;

    fn channel_count(&self) -> u8 {
        match self {
            Board::Relay16(board) => board.channel_count(),
            Board::Gpio { bank, channels } => bank.channel_count().min(*channels),
        }
    }

    fn set_output(&mut self, relay: RelayId, level: Level) -> Result<(), Self::Error> {
        match self {
            Board::Relay16(board) => board.set_output(relay, level).map_err(BoardError::I2c),
            Board::Gpio { bank, channels } => {
                if relay >= *channels {
                    return Err(BoardError::Gpio(InvalidChannel(relay)));
                }
                bank.set_output(relay, level).map_err(BoardError::Gpio)
            }
        }
    }

    fn set_all(&mut self, level: Level) -> Result<(), Self::Error> {
        match self {
            Board::Relay16(board) => board.set_all(level).map_err(BoardError::I2c),
            // Unused pins are driven too so they never float at the active level
            Board::Gpio { bank, .. } => bank.set_all(level).map_err(BoardError::Gpio),
        }
    }
}

/// Embassy time driver as a millisecond clock
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl MonotonicClock for EmbassyClock {
    fn now_ms(&self) -> Millis {
        // Truncation gives the wrapping u32 counter the sequencer expects
        Instant::now().as_millis() as Millis
    }
}
