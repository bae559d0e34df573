//! Embedded decoder configuration

use cdu_pulser_core::config::parse_settings;
use cdu_pulser_core::PulserSettings;
use defmt::*;

/// Embedded configuration (compiled into firmware)
/// Edit pulser.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../pulser.toml");

/// Parse the embedded configuration, falling back to defaults
///
/// `build.rs` already rejects malformed TOML, so a failure here means a
/// value the on-device parser does not accept.
pub fn load_settings() -> PulserSettings {
    match parse_settings(EMBEDDED_CONFIG) {
        Ok(settings) => {
            info!(
                "Loaded pulser.toml: on={}ms recharge={}ms active={}",
                settings.pulser.on_ms(),
                settings.pulser.recharge_ms(),
                settings.pulser.active_level()
            );
            settings
        }
        Err(e) => {
            error!("pulser.toml rejected ({}), using defaults", e);
            PulserSettings::default()
        }
    }
}
