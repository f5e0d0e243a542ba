//! Prelude module for common re-exports.
//!
//! `use atc_common::prelude::*;` brings in the types every crate of the
//! workspace touches.

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::changer::config::AtcConfig;
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_MAX_TOTAL_TOOL, MAX_RACK_SLOTS};

// ─── Tools & I/O ────────────────────────────────────────────────────
pub use crate::io::{HomedAxes, IoPoint};
pub use crate::tool::{ToolClass, ToolNumber};

// ─── Machine Control ────────────────────────────────────────────────
pub use crate::machine::driver::{MachineControl, MachineError, OperatorConsole};
pub use crate::machine::types::{Actuator, AxisPosition, MotionCommand, OperatorResponse};
