//! Frame encoding and decoding for the host link.
//!
//! Frame format:
//! - START (1 byte): 0xA5 synchronization byte
//! - LENGTH (1 byte): payload length (0-8)
//! - TYPE (1 byte): message type identifier
//! - PAYLOAD (0-8 bytes): type-specific data
//! - CHECKSUM (1 byte): XOR of LENGTH, TYPE, and all PAYLOAD bytes

use heapless::Vec;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xA5;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 8;

/// Maximum complete frame size (START + LENGTH + TYPE + MAX_PAYLOAD + CHECKSUM)
pub const MAX_FRAME_SIZE: usize = MAX_PAYLOAD_SIZE + 4;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Length byte out of range
    InvalidLength,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type identifier
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

fn checksum(msg_type: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(payload.len() as u8 ^ msg_type, |acc, &byte| acc ^ byte)
}

impl Frame {
    /// Create a frame with the given message type and payload
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { msg_type, payload })
    }

    /// Create a frame with no payload
    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    /// Encoded size of this frame
    pub fn encoded_len(&self) -> usize {
        self.payload.len() + 4
    }

    /// Encode into `buffer`, returning the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let len = self.encoded_len();
        let out = buffer.get_mut(..len).ok_or(FrameError::BufferTooSmall)?;

        let (head, rest) = out.split_at_mut(3);
        head.copy_from_slice(&[FRAME_START, self.payload.len() as u8, self.msg_type]);
        let (body, tail) = rest.split_at_mut(self.payload.len());
        body.copy_from_slice(&self.payload);
        tail[0] = checksum(self.msg_type, &self.payload);

        Ok(len)
    }

    /// Encode into a fixed-capacity vector
    pub fn to_bytes(&self) -> Vec<u8, MAX_FRAME_SIZE> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        // A frame always fits MAX_FRAME_SIZE
        let len = self.encode(&mut buffer).unwrap_or(0);
        Vec::from_slice(&buffer[..len]).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Sync,
    Length,
    Type { len: u8 },
    Payload { len: u8, msg_type: u8 },
    Checksum { msg_type: u8 },
}

/// Byte-at-a-time frame decoder
///
/// Bytes outside a frame are skipped until the next START byte, so the
/// parser resynchronises after line noise or a dropped byte.
#[derive(Debug, Clone)]
pub struct FrameParser {
    stage: Stage,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a parser waiting for a START byte
    pub const fn new() -> Self {
        Self {
            stage: Stage::Sync,
            payload: Vec::new(),
        }
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.stage = Stage::Sync;
        self.payload.clear();
    }

    /// Feed one byte
    ///
    /// Returns `Ok(Some(frame))` when a frame completes, `Ok(None)` while
    /// more bytes are needed, and `Err` (after resetting) on a bad frame.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        let stage = self.stage;
        self.stage = match stage {
            Stage::Sync if byte == FRAME_START => Stage::Length,
            Stage::Sync => Stage::Sync,
            Stage::Length if usize::from(byte) > MAX_PAYLOAD_SIZE => {
                self.reset();
                return Err(FrameError::InvalidLength);
            }
            Stage::Length => Stage::Type { len: byte },
            Stage::Type { len } => {
                self.payload.clear();
                if len == 0 {
                    Stage::Checksum { msg_type: byte }
                } else {
                    Stage::Payload { len, msg_type: byte }
                }
            }
            Stage::Payload { len, msg_type } => {
                // Length was bounded above, so this cannot overflow
                let _ = self.payload.push(byte);
                if self.payload.len() == usize::from(len) {
                    Stage::Checksum { msg_type }
                } else {
                    Stage::Payload { len, msg_type }
                }
            }
            Stage::Checksum { msg_type } => {
                let valid = byte == checksum(msg_type, &self.payload);
                let frame = Frame {
                    msg_type,
                    payload: core::mem::take(&mut self.payload),
                };
                self.reset();
                return if valid {
                    Ok(Some(frame))
                } else {
                    Err(FrameError::InvalidChecksum)
                };
            }
        };
        Ok(None)
    }
}
