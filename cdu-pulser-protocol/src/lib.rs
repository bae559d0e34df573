//! Host Link Protocol
//!
//! This crate defines the UART protocol between a host (layout control
//! software, a throttle bridge, or a test bench) and the pulser decoder.
//! The host asks for relay pulses or turnout moves; the decoder answers
//! with the queue slot it assigned, or why the request was refused.
//!
//! # Protocol Overview
//!
//! All messages use a simple binary frame format:
//! ```text
//! ┌───────┬────────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B     │ 1B   │ 0–8B        │ 1B       │
//! └───────┴────────┴──────┴─────────────┴──────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;

pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{DecoderReply, HostCommand, MessageError};
