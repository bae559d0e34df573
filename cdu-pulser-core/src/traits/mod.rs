//! Hardware abstraction traits
//!
//! These traits define the interface between the pulse sequencer
//! and hardware-specific implementations.

pub mod clock;
pub mod relay;

pub use clock::MonotonicClock;
pub use relay::{Level, RelayId, RelayOutputs};
