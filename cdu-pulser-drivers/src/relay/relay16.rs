//! 16-channel I2C relay board
//!
//! The board carries an MCP23017-style 16-bit port expander; each expander
//! output drives one relay through a transistor stage. Three address jumpers
//! select a 7-bit address in `0x20..=0x27`.
//!
//! # Register usage
//!
//! With `IOCON.BANK = 0` the port A/B registers are interleaved and the
//! register pointer auto-increments, so both output latches are written in
//! one transaction: `[OLATA, low byte, high byte]`.
//!
//! Port A bit 0 is relay 0, port B bit 7 is relay 15. The driver keeps a
//! shadow copy of the latch and rewrites both bytes on every change.

use cdu_pulser_core::config::{BoardConfig, RELAY16_CHANNELS};
use cdu_pulser_core::traits::{Level, RelayId, RelayOutputs};
use cdu_pulser_hal::I2cBus;

/// Port expander register addresses (IOCON.BANK = 0)
pub mod reg {
    /// Port A direction (1 = input)
    pub const IODIRA: u8 = 0x00;
    /// Port B direction (1 = input)
    pub const IODIRB: u8 = 0x01;
    /// Expander configuration
    pub const IOCON: u8 = 0x0A;
    /// Port A output latch
    pub const OLATA: u8 = 0x14;
    /// Port B output latch
    pub const OLATB: u8 = 0x15;
}

/// Relay16 driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Relay16Error<E> {
    /// I2C transaction failed
    Bus(E),
    /// Relay index beyond the configured channels
    InvalidChannel(RelayId),
}

/// 16-channel I2C relay board
pub struct Relay16<B> {
    bus: B,
    address: u8,
    channels: u8,
    /// Shadow of OLATB:OLATA
    latch: u16,
}

impl<B: I2cBus> Relay16<B> {
    /// Create a driver for the board at `address` using all 16 channels
    ///
    /// Call [`Relay16::init`] before use.
    pub fn new(bus: B, address: u8) -> Self {
        Self {
            bus,
            address,
            channels: RELAY16_CHANNELS,
            latch: 0,
        }
    }

    /// Create a driver from board configuration
    pub fn from_config(bus: B, config: &BoardConfig) -> Self {
        Self {
            bus,
            address: config.i2c_address,
            channels: config.channels.min(RELAY16_CHANNELS),
            latch: 0,
        }
    }

    /// Configure the expander and drive every output to `initial`
    ///
    /// The latch is written before the ports are switched to outputs, so no
    /// relay glitches on at power-up.
    pub fn init(&mut self, initial: Level) -> Result<(), Relay16Error<B::Error>> {
        self.bus
            .write(self.address, &[reg::IOCON, 0x00])
            .map_err(Relay16Error::Bus)?;

        self.latch = Self::fill(initial);
        self.write_latch()?;

        self.bus
            .write(self.address, &[reg::IODIRA, 0x00, 0x00])
            .map_err(Relay16Error::Bus)
    }

    /// 7-bit I2C address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Shadow copy of the output latch (bit n = relay n)
    pub fn latch(&self) -> u16 {
        self.latch
    }

    /// Read the output latch back from the board
    pub fn read_latch(&mut self) -> Result<u16, Relay16Error<B::Error>> {
        let mut buf = [0u8; 2];
        self.bus
            .write_read(self.address, &[reg::OLATA], &mut buf)
            .map_err(Relay16Error::Bus)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Release the bus
    pub fn release(self) -> B {
        self.bus
    }

    fn fill(level: Level) -> u16 {
        match level {
            Level::High => 0xFFFF,
            Level::Low => 0x0000,
        }
    }

    fn write_latch(&mut self) -> Result<(), Relay16Error<B::Error>> {
        let [low, high] = self.latch.to_le_bytes();
        self.bus
            .write(self.address, &[reg::OLATA, low, high])
            .map_err(Relay16Error::Bus)
    }
}

impl<B: I2cBus> RelayOutputs for Relay16<B> {
    type Error = Relay16Error<B::Error>;

    fn channel_count(&self) -> u8 {
        self.channels
    }

    fn set_output(&mut self, relay: RelayId, level: Level) -> Result<(), Self::Error> {
        if relay >= self.channels {
            return Err(Relay16Error::InvalidChannel(relay));
        }

        let mask = 1u16 << relay;
        if level.is_high() {
            self.latch |= mask;
        } else {
            self.latch &= !mask;
        }
        self.write_latch()
    }

    fn set_all(&mut self, level: Level) -> Result<(), Self::Error> {
        self.latch = Self::fill(level);
        self.write_latch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emulates the expander register file with pointer auto-increment
    struct MockExpander {
        regs: [u8; 0x16],
        transactions: usize,
        fail: bool,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Nack;

    impl MockExpander {
        fn new() -> Self {
            let mut regs = [0u8; 0x16];
            // Power-on: all pins inputs
            regs[reg::IODIRA as usize] = 0xFF;
            regs[reg::IODIRB as usize] = 0xFF;
            Self {
                regs,
                transactions: 0,
                fail: false,
            }
        }

        fn olat(&self) -> u16 {
            u16::from_le_bytes([self.regs[reg::OLATA as usize], self.regs[reg::OLATB as usize]])
        }
    }

    impl I2cBus for MockExpander {
        type Error = Nack;

        fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Nack> {
            if self.fail || address != 0x20 {
                return Err(Nack);
            }
            self.transactions += 1;
            let start = data[0] as usize;
            for (i, &byte) in data[1..].iter().enumerate() {
                self.regs[start + i] = byte;
            }
            Ok(())
        }

        fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<(), Nack> {
            if self.fail || address != 0x20 {
                return Err(Nack);
            }
            let start = write[0] as usize;
            read.copy_from_slice(&self.regs[start..start + read.len()]);
            Ok(())
        }
    }

    #[test]
    fn test_init_sets_outputs_after_latch() {
        let mut board = Relay16::new(MockExpander::new(), 0x20);
        board.init(Level::High).unwrap();

        let bus = board.release();
        assert_eq!(bus.olat(), 0xFFFF);
        assert_eq!(bus.regs[reg::IODIRA as usize], 0x00);
        assert_eq!(bus.regs[reg::IODIRB as usize], 0x00);
        assert_eq!(bus.regs[reg::IOCON as usize], 0x00);
    }

    #[test]
    fn test_set_output_updates_single_bit() {
        let mut board = Relay16::new(MockExpander::new(), 0x20);
        board.init(Level::Low).unwrap();

        board.set_output(0, Level::High).unwrap();
        board.set_output(9, Level::High).unwrap();
        assert_eq!(board.latch(), 0b0000_0010_0000_0001);

        board.set_output(0, Level::Low).unwrap();
        assert_eq!(board.read_latch(), Ok(0b0000_0010_0000_0000));
    }

    #[test]
    fn test_all_on_all_off() {
        let mut board = Relay16::new(MockExpander::new(), 0x20);
        board.init(Level::Low).unwrap();

        board.all_on().unwrap();
        assert_eq!(board.read_latch(), Ok(0xFFFF));

        board.all_off().unwrap();
        assert_eq!(board.read_latch(), Ok(0x0000));
    }

    #[test]
    fn test_invalid_channel() {
        let config = BoardConfig {
            channels: 8,
            ..BoardConfig::default()
        };
        let mut board = Relay16::from_config(MockExpander::new(), &config);

        assert_eq!(board.address(), 0x20);
        assert_eq!(board.channel_count(), 8);
        assert_eq!(
            board.set_output(8, Level::High),
            Err(Relay16Error::InvalidChannel(8))
        );
        assert_eq!(board.release().transactions, 0);
    }

    #[test]
    fn test_bus_error_propagates() {
        let mut board = Relay16::new(MockExpander::new(), 0x23);
        assert_eq!(board.init(Level::High), Err(Relay16Error::Bus(Nack)));

        let mut bus = MockExpander::new();
        bus.fail = true;
        let mut board = Relay16::new(bus, 0x20);
        assert_eq!(board.set_output(1, Level::High), Err(Relay16Error::Bus(Nack)));
    }
}
