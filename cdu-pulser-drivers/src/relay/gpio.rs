//! Directly wired relay bank
//!
//! Each relay (or its driver transistor) hangs off one MCU pin.

use cdu_pulser_core::traits::{Level, RelayId, RelayOutputs};
use cdu_pulser_hal::OutputPin;

/// Relay index beyond the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidChannel(pub RelayId);

/// Bank of `N` relays on GPIO pins; relay n is `pins[n]`
pub struct GpioRelayBank<P, const N: usize> {
    pins: [P; N],
}

impl<P: OutputPin, const N: usize> GpioRelayBank<P, N> {
    /// Create a bank from its pins
    ///
    /// Pin levels are left untouched; the sequencer drives every output to
    /// the inactive level when it takes ownership.
    pub fn new(pins: [P; N]) -> Self {
        Self { pins }
    }

    /// Pin for `relay`
    pub fn pin(&self, relay: RelayId) -> Option<&P> {
        self.pins.get(usize::from(relay))
    }

    /// Release the pins
    pub fn release(self) -> [P; N] {
        self.pins
    }
}

impl<P: OutputPin, const N: usize> RelayOutputs for GpioRelayBank<P, N> {
    type Error = InvalidChannel;

    fn channel_count(&self) -> u8 {
        u8::try_from(N).unwrap_or(u8::MAX)
    }

    fn set_output(&mut self, relay: RelayId, level: Level) -> Result<(), Self::Error> {
        let pin = self
            .pins
            .get_mut(usize::from(relay))
            .ok_or(InvalidChannel(relay))?;
        pin.set_state(level.is_high());
        Ok(())
    }

    fn set_all(&mut self, level: Level) -> Result<(), Self::Error> {
        for pin in self.pins.iter_mut() {
            pin.set_state(level.is_high());
        }
        Ok(())
    }
}
