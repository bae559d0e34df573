//! Sequencer states and transition reports

use crate::time::{self, Millis};
use crate::traits::RelayId;

/// Pulse sequencer state
///
/// Timed states carry their deadline, so there is no separate
/// "deadline valid" flag to keep in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulserState {
    /// No relay energized, nothing pending
    #[default]
    Idle,
    /// `relay` is energized until `deadline`
    OnDelay {
        /// Relay being pulsed (always the queue head)
        relay: RelayId,
        /// When the relay is released
        deadline: Millis,
    },
    /// CDU refilling; no relay may fire before `deadline`
    RechargeDelay {
        /// End of the recharge interval
        deadline: Millis,
    },
}

impl PulserState {
    /// Check if this is the idle state
    pub fn is_idle(&self) -> bool {
        matches!(self, PulserState::Idle)
    }

    /// Relay currently energized, if any
    pub fn energized(&self) -> Option<RelayId> {
        match self {
            PulserState::OnDelay { relay, .. } => Some(*relay),
            _ => None,
        }
    }

    /// Deadline of a timed state
    pub fn deadline(&self) -> Option<Millis> {
        match self {
            PulserState::Idle => None,
            PulserState::OnDelay { deadline, .. } | PulserState::RechargeDelay { deadline } => {
                Some(*deadline)
            }
        }
    }

    /// Milliseconds until the next timed transition
    pub fn remaining_ms(&self, now: Millis) -> Option<u32> {
        self.deadline().map(|deadline| time::remaining(now, deadline))
    }

    /// Compact numeric code for status reports
    pub fn code(&self) -> u8 {
        match self {
            PulserState::Idle => 0,
            PulserState::OnDelay { .. } => 1,
            PulserState::RechargeDelay { .. } => 2,
        }
    }
}

/// What a single `tick` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// Nothing due yet
    None,
    /// `relay` was energized
    Energized(RelayId),
    /// `relay` was released and removed from the queue
    Released(RelayId),
    /// Recharge finished with nothing pending
    Idle,
}

/// Outcome of an accepted pulse request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Newly queued
    Queued {
        /// Slot after the advance this request triggered
        slot: usize,
        /// What that advance did
        transition: Transition,
    },
    /// Already pending at this slot; no extra pulse scheduled
    AlreadyQueued(usize),
}

impl Request {
    /// Slot index of the request
    pub fn slot(&self) -> usize {
        match self {
            Request::Queued { slot, .. } | Request::AlreadyQueued(slot) => *slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_accessors() {
        let on = PulserState::OnDelay {
            relay: 4,
            deadline: 250,
        };
        assert_eq!(on.energized(), Some(4));
        assert_eq!(on.deadline(), Some(250));
        assert_eq!(on.remaining_ms(200), Some(50));
        assert_eq!(on.remaining_ms(300), Some(0));

        let recharge = PulserState::RechargeDelay { deadline: 10 };
        assert_eq!(recharge.energized(), None);
        assert_eq!(recharge.code(), 2);

        assert!(PulserState::Idle.is_idle());
        assert_eq!(PulserState::Idle.deadline(), None);
    }

    #[test]
    fn test_request_slot() {
        let queued = Request::Queued {
            slot: 3,
            transition: Transition::None,
        };
        assert_eq!(queued.slot(), 3);
        assert_eq!(Request::AlreadyQueued(0).slot(), 0);
    }
}
