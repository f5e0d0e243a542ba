//! Value types exchanged with the machine-control collaborators.

use crate::tool::ToolNumber;
use core::fmt;
use serde::{Deserialize, Serialize};

// ─── Positions ──────────────────────────────────────────────────────

/// Machine absolute XY position [mm].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisPosition {
    pub x: f64,
    pub y: f64,
}

impl AxisPosition {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ─── Actuators ──────────────────────────────────────────────────────

/// The two pneumatic actuators of the tool changer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actuator {
    /// Spindle chuck. Engaged = open (tool released).
    Chuck,
    /// Sliding tool rack. Engaged = extended under the spindle.
    Rack,
}

impl Actuator {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Chuck => "chuck",
            Self::Rack => "rack",
        }
    }
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Motion Commands ────────────────────────────────────────────────

/// A single motion-executor command in machine absolute coordinates.
///
/// `Display` renders the G-code line handed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    /// `G0 G53` rapid move; axes left `None` are not commanded.
    Rapid {
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
    },
    /// `G1 G53` Z move at a controlled feed rate [mm/min].
    Feed { z: f64, feed: f64 },
    /// `G43 H` tool length offset reload.
    LoadToolOffset(ToolNumber),
}

impl MotionCommand {
    pub const fn rapid_xy(x: f64, y: f64) -> Self {
        Self::Rapid {
            x: Some(x),
            y: Some(y),
            z: None,
        }
    }

    pub const fn rapid_z(z: f64) -> Self {
        Self::Rapid {
            x: None,
            y: None,
            z: Some(z),
        }
    }

    pub const fn feed_z(z: f64, feed: f64) -> Self {
        Self::Feed { z, feed }
    }

    /// Target Z of this command, if it moves Z.
    pub const fn target_z(&self) -> Option<f64> {
        match self {
            Self::Rapid { z, .. } => *z,
            Self::Feed { z, .. } => Some(*z),
            Self::LoadToolOffset(_) => None,
        }
    }
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rapid { x, y, z } => {
                f.write_str("G0 G53")?;
                if let Some(x) = x {
                    write!(f, " X{x}")?;
                }
                if let Some(y) = y {
                    write!(f, " Y{y}")?;
                }
                if let Some(z) = z {
                    write!(f, " Z{z}")?;
                }
                Ok(())
            }
            Self::Feed { z, feed } => write!(f, "G1 F{feed} G53 Z{z}"),
            Self::LoadToolOffset(tool) => write!(f, "G43 H{tool}"),
        }
    }
}

// ─── Operator ───────────────────────────────────────────────────────

/// Answer to a blocking confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorResponse {
    Proceed,
    Cancel,
}
