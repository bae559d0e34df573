//! Pending pulse requests
//!
//! A fixed-capacity FIFO of relay identifiers. Each relay appears at most
//! once; asking for a relay that is already waiting (or currently firing at
//! the head) returns its existing slot instead of queueing a second pulse.

use heapless::Deque;

use crate::traits::RelayId;

/// Default queue depth, one slot per channel of a 16-relay board
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Queue has no free slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

/// Bounded FIFO of pending pulse requests
///
/// Slot indices are positions from the head: index 0 is the next relay to
/// fire (or the one firing now).
#[derive(Debug, Clone)]
pub struct PulseQueue<const N: usize = DEFAULT_QUEUE_CAPACITY> {
    slots: Deque<RelayId, N>,
}

impl<const N: usize> Default for PulseQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PulseQueue<N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            slots: Deque::new(),
        }
    }

    /// Append `relay` unless it is already pending
    ///
    /// Returns the slot index of the request, existing or new.
    pub fn enqueue(&mut self, relay: RelayId) -> Result<usize, QueueFull> {
        if let Some(index) = self.position(relay) {
            return Ok(index);
        }

        let index = self.slots.len();
        self.slots.push_back(relay).map_err(|_| QueueFull)?;
        Ok(index)
    }

    /// Relay at the head of the queue
    pub fn front(&self) -> Option<RelayId> {
        self.slots.front().copied()
    }

    /// Remove the head of the queue, keeping the rest in order
    pub fn pop_front(&mut self) -> Option<RelayId> {
        self.slots.pop_front()
    }

    /// Slot index of `relay`, if pending
    pub fn position(&self, relay: RelayId) -> Option<usize> {
        self.slots.iter().position(|&r| r == relay)
    }

    /// Check whether `relay` is pending
    pub fn contains(&self, relay: RelayId) -> bool {
        self.position(relay).is_some()
    }

    /// Number of pending requests
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no requests are pending
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Check if every slot is taken
    pub fn is_full(&self) -> bool {
        self.slots.is_full()
    }

    /// Maximum number of pending requests
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Pending relays in activation order
    pub fn iter(&self) -> impl Iterator<Item = RelayId> + '_ {
        self.slots.iter().copied()
    }
}
