//! CDU Pulser Hardware Abstraction Layer
//!
//! This crate defines the bus-level traits that relay board drivers are
//! written against. Chip support crates (or the embedded-hal adapters in
//! `cdu-pulser-drivers`) implement them, so the same board driver runs on
//! any MCU and under host tests with a mock bus.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  cdu-pulser-core (sequencer, queue)     │
//! └─────────────────────────────────────────┘
//!                     │ RelayOutputs
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cdu-pulser-drivers (Relay16, GPIO)     │
//! └─────────────────────────────────────────┘
//!                     │ I2cBus / OutputPin
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cdu-pulser-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital output driving one relay coil
//! - [`i2c::I2cBus`] - I2C master used by port-expander relay boards

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;

pub use gpio::OutputPin;
pub use i2c::{I2cBus, I2cConfig};
