//! Configuration types
//!
//! Board-agnostic configuration structures plus the parser for the
//! `pulser.toml` file embedded in the firmware.

pub mod error;
pub mod hardware;
pub mod parse;
pub mod types;

pub use error::ConfigError;
pub use hardware::*;
pub use parse::{parse_settings, ParseError};
pub use types::*;
