//! Turnout accessory addressing
//!
//! Each twin-coil turnout motor uses two adjacent relays: the even relay
//! throws it to the closed route, the odd relay to the diverging route.
//! A decoder answers a contiguous block of accessory addresses starting at
//! its base address.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::traits::RelayId;

/// Lowest valid accessory address
pub const MIN_ACCESSORY_ADDRESS: u16 = 1;

/// Highest valid accessory address
pub const MAX_ACCESSORY_ADDRESS: u16 = 2044;

/// Turnout route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TurnoutDirection {
    /// Straight-through route
    Closed,
    /// Diverging route
    Thrown,
}

impl TurnoutDirection {
    /// Relay offset within the turnout's pair
    const fn offset(self) -> u8 {
        match self {
            TurnoutDirection::Closed => 0,
            TurnoutDirection::Thrown => 1,
        }
    }
}

/// Accessory command addressed to one turnout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccessoryCommand {
    /// Accessory address
    pub address: u16,
    /// Requested route
    pub direction: TurnoutDirection,
}

/// Maps accessory addresses onto relay pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TurnoutMap {
    /// Accessory address of the first turnout
    pub base_address: u16,
    /// Number of turnouts served
    pub count: u8,
}

impl Default for TurnoutMap {
    fn default() -> Self {
        Self {
            base_address: MIN_ACCESSORY_ADDRESS,
            count: 8,
        }
    }
}

impl TurnoutMap {
    /// Create a map for `count` turnouts starting at `base_address`
    pub const fn new(base_address: u16, count: u8) -> Self {
        Self {
            base_address,
            count,
        }
    }

    /// Relay channels consumed by this map
    pub const fn relays_needed(&self) -> u16 {
        self.count as u16 * 2
    }

    /// Check the address block lies within the accessory address space
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_address < MIN_ACCESSORY_ADDRESS {
            return Err(ConfigError::InvalidAddress);
        }
        let last = u32::from(self.base_address) + u32::from(self.count);
        if self.count > 0 && last - 1 > u32::from(MAX_ACCESSORY_ADDRESS) {
            return Err(ConfigError::InvalidAddress);
        }
        Ok(())
    }

    /// Relay that drives `address` to `direction`, if the address is ours
    pub fn relay_for(&self, address: u16, direction: TurnoutDirection) -> Option<RelayId> {
        let index = address.checked_sub(self.base_address)?;
        if index >= u16::from(self.count) {
            return None;
        }
        RelayId::try_from(index * 2 + u16::from(direction.offset())).ok()
    }

    /// Relay for an accessory command
    pub fn resolve(&self, command: AccessoryCommand) -> Option<RelayId> {
        self.relay_for(command.address, command.direction)
    }

    /// Turnout address and route driven by `relay`
    pub fn turnout_for(&self, relay: RelayId) -> Option<AccessoryCommand> {
        if u16::from(relay) >= self.relays_needed() {
            return None;
        }
        let direction = if relay % 2 == 0 {
            TurnoutDirection::Closed
        } else {
            TurnoutDirection::Thrown
        };
        // Unvalidated maps may run past u16::MAX
        let address = self.base_address.checked_add(u16::from(relay / 2))?;
        Some(AccessoryCommand { address, direction })
    }
}
