//! Board-agnostic core logic for the CDU pulser firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (relay outputs, monotonic clock)
//! - Pending pulse queue
//! - Pulse sequencing state machine
//! - Wrap-safe millisecond arithmetic
//! - Turnout address mapping
//! - Configuration types and the `pulser.toml` parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod queue;
pub mod sequencer;
pub mod time;
pub mod traits;
pub mod turnout;

pub use config::{PulserConfig, PulserSettings};
pub use queue::{PulseQueue, QueueFull};
pub use sequencer::{PulseError, PulseSequencer, PulserState, Request, Transition};
pub use traits::{Level, MonotonicClock, RelayId, RelayOutputs};
