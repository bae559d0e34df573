//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in cdu-pulser-core for relay hardware:
//!
//! - Relay boards (I2C port expander, direct GPIO)
//! - embedded-hal adapters for the bus traits in cdu-pulser-hal

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod relay;

pub use bus::{HalI2c, HalPin};
pub use relay::{GpioRelayBank, Relay16, Relay16Error};
