//! CDU pulse sequencing
//!
//! Sequences relay pulses so only one relay is energized at a time and the
//! capacitor discharge unit gets a full recharge interval between pulses.

pub mod machine;
pub mod state;

pub use machine::{PulseError, PulseSequencer};
pub use state::{PulserState, Request, Transition};
