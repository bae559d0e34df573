//! Message types carried in host link frames.
//!
//! Host → decoder message types live in `0x01..=0x7F`, decoder → host
//! replies in `0x80..=0xFF`. Multi-byte fields are little endian.

use crate::frame::Frame;

/// Message type identifiers
pub mod msg_type {
    // Host → decoder
    pub const PULSE: u8 = 0x01;
    pub const ACCESSORY: u8 = 0x02;
    pub const STATUS: u8 = 0x03;
    pub const PING: u8 = 0x04;

    // Decoder → host
    pub const QUEUED: u8 = 0x81;
    pub const ALREADY_QUEUED: u8 = 0x82;
    pub const QUEUE_FULL: u8 = 0x83;
    pub const REJECTED: u8 = 0x84;
    pub const STATUS_REPORT: u8 = 0x85;
    pub const PONG: u8 = 0x86;
    pub const UNKNOWN_ADDRESS: u8 = 0x87;
}

/// Errors decoding a frame into a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// Frame type is not a known message
    UnknownType(u8),
    /// Payload length or contents do not match the message type
    InvalidPayload,
}

impl core::fmt::Display for MessageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownType(t) => write!(f, "unknown message type 0x{:02x}", t),
            Self::InvalidPayload => write!(f, "invalid payload"),
        }
    }
}

/// Commands sent by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand {
    /// Pulse a relay by channel number
    Pulse { relay: u8 },
    /// Move a turnout by accessory address
    Accessory { address: u16, thrown: bool },
    /// Request a status report
    Status,
    /// Link check
    Ping,
}

impl HostCommand {
    /// Decode a command from a received frame
    pub fn from_frame(frame: &Frame) -> Result<Self, MessageError> {
        let payload = frame.payload.as_slice();
        match (frame.msg_type, payload) {
            (msg_type::PULSE, &[relay]) => Ok(Self::Pulse { relay }),
            (msg_type::ACCESSORY, &[lo, hi, direction]) => {
                let thrown = match direction {
                    0 => false,
                    1 => true,
                    _ => return Err(MessageError::InvalidPayload),
                };
                Ok(Self::Accessory {
                    address: u16::from_le_bytes([lo, hi]),
                    thrown,
                })
            }
            (msg_type::STATUS, &[]) => Ok(Self::Status),
            (msg_type::PING, &[]) => Ok(Self::Ping),
            (msg_type::PULSE | msg_type::ACCESSORY | msg_type::STATUS | msg_type::PING, _) => {
                Err(MessageError::InvalidPayload)
            }
            (other, _) => Err(MessageError::UnknownType(other)),
        }
    }

    /// Encode into a frame (used by host-side tools and tests)
    pub fn to_frame(&self) -> Frame {
        let (ty, buf, len): (u8, [u8; 3], usize) = match *self {
            Self::Pulse { relay } => (msg_type::PULSE, [relay, 0, 0], 1),
            Self::Accessory { address, thrown } => {
                let [lo, hi] = address.to_le_bytes();
                (msg_type::ACCESSORY, [lo, hi, thrown as u8], 3)
            }
            Self::Status => (msg_type::STATUS, [0; 3], 0),
            Self::Ping => (msg_type::PING, [0; 3], 0),
        };
        frame_from(ty, &buf[..len])
    }
}

/// Replies sent by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderReply {
    /// Request accepted into the given queue slot
    Queued { relay: u8, slot: u8 },
    /// Relay was already pending at the given slot
    AlreadyQueued { relay: u8, slot: u8 },
    /// Queue is full; request dropped
    QueueFull { relay: u8 },
    /// Relay is out of range for the board
    Rejected { relay: u8 },
    /// Sequencer state code (0 idle, 1 on, 2 recharge) and pending count
    Status { state: u8, pending: u8 },
    /// Reply to `Ping`
    Pong,
    /// Accessory address not mapped to a relay
    UnknownAddress { address: u16 },
}

impl DecoderReply {
    /// Encode into a frame
    pub fn to_frame(&self) -> Frame {
        let (ty, buf, len): (u8, [u8; 2], usize) = match *self {
            Self::Queued { relay, slot } => (msg_type::QUEUED, [relay, slot], 2),
            Self::AlreadyQueued { relay, slot } => (msg_type::ALREADY_QUEUED, [relay, slot], 2),
            Self::QueueFull { relay } => (msg_type::QUEUE_FULL, [relay, 0], 1),
            Self::Rejected { relay } => (msg_type::REJECTED, [relay, 0], 1),
            Self::Status { state, pending } => (msg_type::STATUS_REPORT, [state, pending], 2),
            Self::Pong => (msg_type::PONG, [0; 2], 0),
            Self::UnknownAddress { address } => {
                (msg_type::UNKNOWN_ADDRESS, address.to_le_bytes(), 2)
            }
        };
        frame_from(ty, &buf[..len])
    }

    /// Decode a reply (used by host-side tools and tests)
    pub fn from_frame(frame: &Frame) -> Result<Self, MessageError> {
        match (frame.msg_type, frame.payload.as_slice()) {
            (msg_type::QUEUED, &[relay, slot]) => Ok(Self::Queued { relay, slot }),
            (msg_type::ALREADY_QUEUED, &[relay, slot]) => Ok(Self::AlreadyQueued { relay, slot }),
            (msg_type::QUEUE_FULL, &[relay]) => Ok(Self::QueueFull { relay }),
            (msg_type::REJECTED, &[relay]) => Ok(Self::Rejected { relay }),
            (msg_type::STATUS_REPORT, &[state, pending]) => Ok(Self::Status { state, pending }),
            (msg_type::PONG, &[]) => Ok(Self::Pong),
            (msg_type::UNKNOWN_ADDRESS, &[lo, hi]) => Ok(Self::UnknownAddress {
                address: u16::from_le_bytes([lo, hi]),
            }),
            (0x81..=0x87, _) => Err(MessageError::InvalidPayload),
            (other, _) => Err(MessageError::UnknownType(other)),
        }
    }
}

fn frame_from(msg_type: u8, payload: &[u8]) -> Frame {
    // Message payloads are at most three bytes
    Frame::new(msg_type, payload).unwrap_or_else(|_| Frame::empty(msg_type))
}
