//! Relay board output trait

/// Relay channel index on a board, `0..channel_count`
pub type RelayId = u8;

/// Electrical logic level driven onto a relay output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1
    #[default]
    High,
}

impl Level {
    /// The opposite level
    pub const fn inverse(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    /// True for [`Level::High`]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Build from a pin-style boolean (true = high)
    pub const fn from_high(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// A bank of relay outputs
///
/// Implementations write raw logic levels; which level energizes a relay is
/// decided by the caller. Writes are idempotent, and a failed write is
/// reported rather than retried.
pub trait RelayOutputs {
    /// Error type for output writes
    type Error;

    /// Number of relay channels on the board
    fn channel_count(&self) -> u8;

    /// Drive one relay output to `level`
    fn set_output(&mut self, relay: RelayId, level: Level) -> Result<(), Self::Error>;

    /// Drive every output to `level`
    fn set_all(&mut self, level: Level) -> Result<(), Self::Error>;

    /// Drive every output high
    fn all_on(&mut self) -> Result<(), Self::Error> {
        self.set_all(Level::High)
    }

    /// Drive every output low
    fn all_off(&mut self) -> Result<(), Self::Error> {
        self.set_all(Level::Low)
    }

    /// Check whether `relay` names a channel on this board
    fn is_valid(&self, relay: RelayId) -> bool {
        relay < self.channel_count()
    }
}

impl<T: RelayOutputs + ?Sized> RelayOutputs for &mut T {
    type Error = T::Error;

    fn channel_count(&self) -> u8 {
        (**self).channel_count()
    }

    fn set_output(&mut self, relay: RelayId, level: Level) -> Result<(), Self::Error> {
        (**self).set_output(relay, level)
    }

    fn set_all(&mut self, level: Level) -> Result<(), Self::Error> {
        (**self).set_all(level)
    }
}
