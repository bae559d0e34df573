//! embedded-hal adapters
//!
//! Chip HALs (embassy-rp and friends) implement the embedded-hal 1.0 traits.
//! These wrappers expose them through the `cdu-pulser-hal` traits that the
//! board drivers are written against.

use core::convert::Infallible;

use cdu_pulser_core::traits::Level;
use cdu_pulser_hal::{I2cBus, OutputPin};
use embedded_hal::digital::OutputPin as HalOutputPin;
use embedded_hal::i2c::{ErrorType, I2c};

/// [`I2cBus`] over any blocking embedded-hal I2C master
pub struct HalI2c<T> {
    i2c: T,
}

impl<T: I2c> HalI2c<T> {
    /// Wrap an embedded-hal I2C master
    pub fn new(i2c: T) -> Self {
        Self { i2c }
    }

    /// Unwrap the I2C master
    pub fn into_inner(self) -> T {
        self.i2c
    }
}

impl<T: I2c> I2cBus for HalI2c<T> {
    type Error = <T as ErrorType>::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(address, data)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c.write_read(address, write_data, read_buf)
    }
}

/// [`OutputPin`] over an infallible embedded-hal output pin
///
/// Tracks the last written level, since embedded-hal only reports it through
/// `StatefulOutputPin`.
pub struct HalPin<T> {
    pin: T,
    high: bool,
}

impl<T: HalOutputPin<Error = Infallible>> HalPin<T> {
    /// Wrap a pin and drive it to `initial`
    ///
    /// Pass the relay's inactive level so an active-low bank does not fire
    /// while the firmware is still starting.
    pub fn new(pin: T, initial: Level) -> Self {
        let mut pin = Self { pin, high: false };
        pin.set_state(initial.is_high());
        pin
    }
}

impl<T: HalOutputPin<Error = Infallible>> OutputPin for HalPin<T> {
    fn set_high(&mut self) {
        self.pin.set_high().unwrap_or_else(|never| match never {});
        self.high = true;
    }

    fn set_low(&mut self) {
        self.pin.set_low().unwrap_or_else(|never| match never {});
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}
