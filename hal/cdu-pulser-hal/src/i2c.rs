//! I2C bus abstractions
//!
//! Port-expander relay boards only need register writes and a register
//! read-back, so the trait stays that small.

/// I2C bus master
pub trait I2cBus {
    /// Bus failure (NACK, arbitration loss, timeout)
    type Error;

    /// Write `data` to the device at 7-bit `address`
    ///
    /// For register-based devices the first byte is the register pointer.
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Write `write_data`, then read into `read_buf` after a repeated start
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

/// Bus clock settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// SCL frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// 100 kHz
    ///
    /// Relay boards often sit at the end of long ribbon cables next to
    /// switching coils, so this is the default.
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// 400 kHz, for short runs
    pub const FAST: Self = Self { frequency: 400_000 };
}
