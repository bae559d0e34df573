//! Relay board implementations
//!
//! Each board type implements `RelayOutputs`, so the sequencer runs
//! unchanged on any of them:
//!
//! - Relay16: 16 relays behind an I2C port expander
//! - GPIO bank: relays wired straight to MCU pins

pub mod gpio;
pub mod relay16;

pub use gpio::{GpioRelayBank, InvalidChannel};
pub use relay16::{Relay16, Relay16Error};
