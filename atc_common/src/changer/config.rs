//! Configuration structures for the tool changer.
//!
//! All config types use `serde::Deserialize` for TOML loading. Every field
//! carries a default matching the reference machine (STEPCRAFT Q-series with
//! a sliding rear rack), so an empty file is a valid configuration.
//! Coordinates are machine absolute millimetres; durations are milliseconds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{DEFAULT_MAX_TOTAL_TOOL, MAX_RACK_SLOTS, TOOL_NUMBER_CEILING};
use crate::io::IoPoint;
use crate::machine::types::Actuator;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete tool changer configuration.
///
/// Loaded once before a cycle is invoked; immutable afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtcConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub rack: RackConfig,
    #[serde(default)]
    pub heights: HeightConfig,
    #[serde(default)]
    pub park: ParkConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub io: ActuatorIoConfig,
}

impl AtcConfig {
    /// Validate parameter bounds and cross-section consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.rack.validate()?;

        let max = self.tools.max_total_tool;
        if max < self.rack.slots as i32 || max > TOOL_NUMBER_CEILING {
            return Err(ConfigError::ValidationError(format!(
                "max_total_tool {} out of range [{}, {}]",
                max, self.rack.slots, TOOL_NUMBER_CEILING
            )));
        }

        self.heights.validate()?;
        // Manual handling happens at park; the descent there is not rack-aware.
        if self.park.z < self.heights.safe_z {
            return Err(ConfigError::ValidationError(format!(
                "park.z {} below safe_z {}",
                self.park.z, self.heights.safe_z
            )));
        }
        self.motion.validate()?;
        self.io.validate()?;
        Ok(())
    }
}

// ─── Tools ──────────────────────────────────────────────────────────

/// Tool numbering limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Highest tool number accepted for a change (default: 48).
    #[serde(default = "default_max_total_tool")]
    pub max_total_tool: i32,
}

fn default_max_total_tool() -> i32 {
    DEFAULT_MAX_TOTAL_TOOL
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_total_tool: DEFAULT_MAX_TOTAL_TOOL,
        }
    }
}

// ─── Rack ───────────────────────────────────────────────────────────

/// Sliding rack geometry.
///
/// Slot `n` (1-based) sits at `base + (n - 1) * pitch + corrections[n - 1]`.
/// Pitch may be negative to reverse the slot direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RackConfig {
    /// Number of populated rack slots (default: 10, max: `MAX_RACK_SLOTS`).
    #[serde(default = "default_rack_slots")]
    pub slots: u8,
    /// Slot 1 X position.
    #[serde(default = "default_base_x")]
    pub base_x: f64,
    /// Slot 1 Y position.
    #[serde(default = "default_base_y")]
    pub base_y: f64,
    /// X distance between adjacent slots.
    #[serde(default = "default_pitch_x")]
    pub pitch_x: f64,
    /// Y distance between adjacent slots.
    #[serde(default)]
    pub pitch_y: f64,
    /// Optional per-slot `[dx, dy]` trim, indexed from slot 1.
    #[serde(default)]
    pub corrections: Vec<[f64; 2]>,
}

fn default_rack_slots() -> u8 {
    MAX_RACK_SLOTS as u8
}
fn default_base_x() -> f64 {
    23.925
}
fn default_base_y() -> f64 {
    2409.3
}
fn default_pitch_x() -> f64 {
    130.0
}

impl Default for RackConfig {
    fn default() -> Self {
        Self {
            slots: default_rack_slots(),
            base_x: default_base_x(),
            base_y: default_base_y(),
            pitch_x: default_pitch_x(),
            pitch_y: 0.0,
            corrections: Vec::new(),
        }
    }
}

impl RackConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.slots == 0 || self.slots as usize > MAX_RACK_SLOTS {
            return Err(ConfigError::ValidationError(format!(
                "rack.slots {} out of range [1, {}]",
                self.slots, MAX_RACK_SLOTS
            )));
        }
        if self.corrections.len() > self.slots as usize {
            return Err(ConfigError::ValidationError(format!(
                "rack.corrections has {} entries for {} slots",
                self.corrections.len(),
                self.slots
            )));
        }
        if self.pitch_x == 0.0 && self.pitch_y == 0.0 && self.slots > 1 {
            return Err(ConfigError::ValidationError(
                "rack pitch cannot be zero on both axes".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Heights ────────────────────────────────────────────────────────

/// Z heights used by the change cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightConfig {
    /// Z for every XY traverse (default: -3.0).
    #[serde(default = "default_safe_z")]
    pub safe_z: f64,
    /// Z where the tool slides into the rack clamp. Must match the rack.
    #[serde(default = "default_tool_release_z")]
    pub tool_release_z: f64,
    /// Rise above release height while the chuck lets go of the stud.
    #[serde(default = "default_eject_offset")]
    pub eject_offset: f64,
    /// Height above release where the chuck closes before the final descent.
    #[serde(default = "default_engage_offset")]
    pub engage_offset: f64,
    /// Added to `safe_z` when clearing the studs after an eject.
    /// Negative values stay closer to the pull studs.
    #[serde(default)]
    pub travel_offset: f64,
}

fn default_safe_z() -> f64 {
    -3.0
}
fn default_tool_release_z() -> f64 {
    -79.9
}
fn default_eject_offset() -> f64 {
    7.0
}
fn default_engage_offset() -> f64 {
    3.5
}

impl Default for HeightConfig {
    fn default() -> Self {
        Self {
            safe_z: default_safe_z(),
            tool_release_z: default_tool_release_z(),
            eject_offset: default_eject_offset(),
            engage_offset: default_engage_offset(),
            travel_offset: 0.0,
        }
    }
}

impl HeightConfig {
    /// Z reached at feed rate while ejecting.
    #[inline]
    pub fn eject_z(&self) -> f64 {
        self.tool_release_z + self.eject_offset
    }

    /// Z where the chuck closes before engaging a stud.
    #[inline]
    pub fn engage_approach_z(&self) -> f64 {
        self.tool_release_z + self.engage_offset
    }

    /// Z used to clear the pull studs after an eject.
    #[inline]
    pub fn travel_z(&self) -> f64 {
        self.safe_z + self.travel_offset
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tool_release_z >= self.safe_z {
            return Err(ConfigError::ValidationError(format!(
                "heights.tool_release_z {} must be below safe_z {}",
                self.tool_release_z, self.safe_z
            )));
        }
        if self.eject_offset <= 0.0 || self.engage_offset <= 0.0 {
            return Err(ConfigError::ValidationError(
                "heights.eject_offset and heights.engage_offset must be positive".to_string(),
            ));
        }
        if self.eject_z() >= self.safe_z || self.engage_approach_z() >= self.safe_z {
            return Err(ConfigError::ValidationError(
                "eject/engage heights must stay below safe_z".to_string(),
            ));
        }
        if self.travel_z() <= self.eject_z() {
            return Err(ConfigError::ValidationError(format!(
                "travel height {} does not clear eject height {}",
                self.travel_z(),
                self.eject_z()
            )));
        }
        Ok(())
    }
}

// ─── Park ───────────────────────────────────────────────────────────

/// Manual tool handling position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkConfig {
    #[serde(default = "default_park_x")]
    pub x: f64,
    #[serde(default = "default_park_y")]
    pub y: f64,
    #[serde(default = "default_safe_z")]
    pub z: f64,
}

fn default_park_x() -> f64 {
    597.115
}
fn default_park_y() -> f64 {
    -2279.7625
}

impl Default for ParkConfig {
    fn default() -> Self {
        Self {
            x: default_park_x(),
            y: default_park_y(),
            z: default_safe_z(),
        }
    }
}

// ─── Motion ─────────────────────────────────────────────────────────

/// Motion execution limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Z feed rate for eject/engage moves [mm/min] (default: 2000).
    /// Tied to air pressure and stud geometry.
    #[serde(default = "default_feed_rate_z")]
    pub feed_rate_z: f64,
    /// Poll interval while waiting for motion to settle [ms] (default: 10).
    #[serde(default = "default_settle_poll_ms")]
    pub settle_poll_ms: u64,
    /// Give up waiting for a single move after this long [ms] (default: 120000).
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,
}

fn default_feed_rate_z() -> f64 {
    2000.0
}
fn default_settle_poll_ms() -> u64 {
    10
}
fn default_settle_timeout_ms() -> u64 {
    120_000
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            feed_rate_z: default_feed_rate_z(),
            settle_poll_ms: default_settle_poll_ms(),
            settle_timeout_ms: default_settle_timeout_ms(),
        }
    }
}

impl MotionConfig {
    #[inline]
    pub fn settle_poll(&self) -> Duration {
        Duration::from_millis(self.settle_poll_ms)
    }

    #[inline]
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.feed_rate_z > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "motion.feed_rate_z {} must be positive",
                self.feed_rate_z
            )));
        }
        if self.settle_poll_ms == 0 {
            return Err(ConfigError::ValidationError(
                "motion.settle_poll_ms must be at least 1".to_string(),
            ));
        }
        if self.settle_timeout_ms < self.settle_poll_ms {
            return Err(ConfigError::ValidationError(format!(
                "motion.settle_timeout_ms {} shorter than poll interval {}",
                self.settle_timeout_ms, self.settle_poll_ms
            )));
        }
        Ok(())
    }
}

// ─── Timing ─────────────────────────────────────────────────────────

/// Fixed dwell times [ms].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Spindle run-down after M5 (default: 9000).
    #[serde(default = "default_spindle_spin_down_ms")]
    pub spindle_spin_down_ms: u64,
    /// Full rack extend/retract travel (default: 3750).
    #[serde(default = "default_rack_travel_ms")]
    pub rack_travel_ms: u64,
    /// Pause after an unexpected extended rack is found (default: 100).
    #[serde(default = "default_rack_precheck_ms")]
    pub rack_precheck_ms: u64,
    /// Minimum settle after any chuck command (default: 5).
    #[serde(default = "default_chuck_settle_ms")]
    pub chuck_settle_ms: u64,
    /// Dwell after opening an empty chuck (default: 300).
    #[serde(default = "default_empty_chuck_open_ms")]
    pub empty_chuck_open_ms: u64,
    /// Strain relief between chuck open and Z rise on eject (default: 50).
    #[serde(default = "default_strain_relief_ms")]
    pub strain_relief_ms: u64,
    /// Dwell after the eject rise (default: 200).
    #[serde(default = "default_eject_settle_ms")]
    pub eject_settle_ms: u64,
    /// Dwell after closing the chuck on a stud (default: 5).
    #[serde(default = "default_engage_dwell_ms")]
    pub engage_dwell_ms: u64,
    /// Dwell after the engage descent (default: 200).
    #[serde(default = "default_engage_settle_ms")]
    pub engage_settle_ms: u64,
    /// Pause before force-closing an inconsistent chuck (default: 100).
    #[serde(default = "default_chuck_reset_pre_ms")]
    pub chuck_reset_pre_ms: u64,
    /// Dwell after force-closing an inconsistent chuck (default: 500).
    #[serde(default = "default_chuck_reset_close_ms")]
    pub chuck_reset_close_ms: u64,
}

fn default_spindle_spin_down_ms() -> u64 {
    9000
}
fn default_rack_travel_ms() -> u64 {
    3750
}
fn default_rack_precheck_ms() -> u64 {
    100
}
fn default_chuck_settle_ms() -> u64 {
    5
}
fn default_empty_chuck_open_ms() -> u64 {
    300
}
fn default_strain_relief_ms() -> u64 {
    50
}
fn default_eject_settle_ms() -> u64 {
    200
}
fn default_engage_dwell_ms() -> u64 {
    5
}
fn default_engage_settle_ms() -> u64 {
    200
}
fn default_chuck_reset_pre_ms() -> u64 {
    100
}
fn default_chuck_reset_close_ms() -> u64 {
    500
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            spindle_spin_down_ms: default_spindle_spin_down_ms(),
            rack_travel_ms: default_rack_travel_ms(),
            rack_precheck_ms: default_rack_precheck_ms(),
            chuck_settle_ms: default_chuck_settle_ms(),
            empty_chuck_open_ms: default_empty_chuck_open_ms(),
            strain_relief_ms: default_strain_relief_ms(),
            eject_settle_ms: default_eject_settle_ms(),
            engage_dwell_ms: default_engage_dwell_ms(),
            engage_settle_ms: default_engage_settle_ms(),
            chuck_reset_pre_ms: default_chuck_reset_pre_ms(),
            chuck_reset_close_ms: default_chuck_reset_close_ms(),
        }
    }
}

impl TimingConfig {
    #[inline]
    pub fn spindle_spin_down(&self) -> Duration {
        Duration::from_millis(self.spindle_spin_down_ms)
    }
    #[inline]
    pub fn rack_travel(&self) -> Duration {
        Duration::from_millis(self.rack_travel_ms)
    }
    #[inline]
    pub fn rack_precheck(&self) -> Duration {
        Duration::from_millis(self.rack_precheck_ms)
    }
    #[inline]
    pub fn chuck_settle(&self) -> Duration {
        Duration::from_millis(self.chuck_settle_ms)
    }
    #[inline]
    pub fn empty_chuck_open(&self) -> Duration {
        Duration::from_millis(self.empty_chuck_open_ms)
    }
    #[inline]
    pub fn strain_relief(&self) -> Duration {
        Duration::from_millis(self.strain_relief_ms)
    }
    #[inline]
    pub fn eject_settle(&self) -> Duration {
        Duration::from_millis(self.eject_settle_ms)
    }
    #[inline]
    pub fn engage_dwell(&self) -> Duration {
        Duration::from_millis(self.engage_dwell_ms)
    }
    #[inline]
    pub fn engage_settle(&self) -> Duration {
        Duration::from_millis(self.engage_settle_ms)
    }
    #[inline]
    pub fn chuck_reset_pre(&self) -> Duration {
        Duration::from_millis(self.chuck_reset_pre_ms)
    }
    #[inline]
    pub fn chuck_reset_close(&self) -> Duration {
        Duration::from_millis(self.chuck_reset_close_ms)
    }

    /// Minimum settle for a command on `actuator`.
    pub fn actuator_settle(&self, actuator: Actuator) -> Duration {
        match actuator {
            Actuator::Chuck => self.chuck_settle(),
            Actuator::Rack => self.rack_travel(),
        }
    }
}

// ─── Actuator I/O ───────────────────────────────────────────────────

/// Output and feedback points of the pneumatic actuators.
///
/// The reference machine reads its feedback from the same pin number it
/// drives, so sensor and output default to identical points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorIoConfig {
    #[serde(default = "default_chuck_point")]
    pub chuck_output: IoPoint,
    #[serde(default = "default_chuck_point")]
    pub chuck_sensor: IoPoint,
    #[serde(default = "default_rack_point")]
    pub rack_output: IoPoint,
    #[serde(default = "default_rack_point")]
    pub rack_sensor: IoPoint,
}

fn default_chuck_point() -> IoPoint {
    IoPoint::new(1, 14)
}
fn default_rack_point() -> IoPoint {
    IoPoint::new(1, 16)
}

impl Default for ActuatorIoConfig {
    fn default() -> Self {
        Self {
            chuck_output: default_chuck_point(),
            chuck_sensor: default_chuck_point(),
            rack_output: default_rack_point(),
            rack_sensor: default_rack_point(),
        }
    }
}

impl ActuatorIoConfig {
    /// Output point driving `actuator`.
    pub const fn output(&self, actuator: Actuator) -> IoPoint {
        match actuator {
            Actuator::Chuck => self.chuck_output,
            Actuator::Rack => self.rack_output,
        }
    }

    /// Feedback point of `actuator`.
    pub const fn sensor(&self, actuator: Actuator) -> IoPoint {
        match actuator {
            Actuator::Chuck => self.chuck_sensor,
            Actuator::Rack => self.rack_sensor,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chuck_output == self.rack_output {
            return Err(ConfigError::ValidationError(format!(
                "chuck and rack share output {}",
                self.chuck_output
            )));
        }
        if self.chuck_sensor == self.rack_sensor {
            return Err(ConfigError::ValidationError(format!(
                "chuck and rack share sensor {}",
                self.chuck_sensor
            )));
        }
        Ok(())
    }
}
