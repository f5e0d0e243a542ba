//! Simulation driver configuration.

use serde::{Deserialize, Serialize};

/// Tunables of the simulated machine.
///
/// Loadable from TOML through `atc_common::config::ConfigLoader`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Rapid traverse speed in mm/s, applied to the longest axis of a move.
    #[serde(default = "default_rapid_speed")]
    pub rapid_speed: f64,
    /// Machine position at power-up, `[x, y, z]`.
    #[serde(default = "default_start_position")]
    pub start_position: [f64; 3],
    /// Delay between a chuck output edge and its sensor following, ms.
    #[serde(default = "default_chuck_sensor_delay_ms")]
    pub chuck_sensor_delay_ms: u64,
    /// Delay between a rack output edge and its sensor following, ms.
    #[serde(default = "default_rack_sensor_delay_ms")]
    pub rack_sensor_delay_ms: u64,
    /// Whether X, Y and Z start referenced.
    #[serde(default = "default_homed")]
    pub homed: bool,
}

fn default_rapid_speed() -> f64 {
    150.0
}
fn default_start_position() -> [f64; 3] {
    [250.0, 1500.0, -3.0]
}
fn default_chuck_sensor_delay_ms() -> u64 {
    20
}
fn default_rack_sensor_delay_ms() -> u64 {
    3000
}
fn default_homed() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rapid_speed: default_rapid_speed(),
            start_position: default_start_position(),
            chuck_sensor_delay_ms: default_chuck_sensor_delay_ms(),
            rack_sensor_delay_ms: default_rack_sensor_delay_ms(),
            homed: default_homed(),
        }
    }
}
