//! Tool slot map: tool number → rack XY position.
//!
//! Derived once from the rack geometry at load time and never recomputed
//! during a cycle. Capacity is fixed at compile time (`MAX_RACK_SLOTS`).

use atc_common::changer::config::RackConfig;
use atc_common::config::ConfigError;
use atc_common::consts::MAX_RACK_SLOTS;
use atc_common::tool::{ToolClass, ToolNumber};
use heapless::Vec;
use serde::Serialize;

/// Rack slot position in machine absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToolPosition {
    pub x: f64,
    pub y: f64,
}

/// Immutable lookup from rack-resident tool number to slot position.
#[derive(Debug, Clone)]
pub struct ToolSlotMap {
    positions: Vec<ToolPosition, MAX_RACK_SLOTS>,
}

impl ToolSlotMap {
    /// Build the map from rack geometry.
    ///
    /// Slot `n` is placed at `base + (n - 1) * pitch`, plus the optional
    /// per-slot correction.
    pub fn from_rack(rack: &RackConfig) -> Result<Self, ConfigError> {
        let mut positions = Vec::new();
        for index in 0..rack.slots as usize {
            let [dx, dy] = rack.corrections.get(index).copied().unwrap_or([0.0, 0.0]);
            let step = index as f64;
            let position = ToolPosition {
                x: rack.base_x + step * rack.pitch_x + dx,
                y: rack.base_y + step * rack.pitch_y + dy,
            };
            positions.push(position).map_err(|_| {
                ConfigError::ValidationError(format!(
                    "rack.slots {} exceeds capacity {}",
                    rack.slots, MAX_RACK_SLOTS
                ))
            })?;
        }
        Ok(Self { positions })
    }

    /// Number of rack slots.
    #[inline]
    pub fn slots(&self) -> u8 {
        self.positions.len() as u8
    }

    /// Classify a tool against this rack.
    #[inline]
    pub fn classify(&self, tool: ToolNumber) -> ToolClass {
        tool.classify(self.slots())
    }

    /// Stored position of a rack-resident tool, `None` otherwise.
    pub fn position(&self, tool: ToolNumber) -> Option<ToolPosition> {
        match self.classify(tool) {
            ToolClass::RackResident(slot) => self.positions.get(slot as usize - 1).copied(),
            ToolClass::Empty | ToolClass::Overflow | ToolClass::Invalid => None,
        }
    }

    /// All slot positions, slot 1 first.
    pub fn iter(&self) -> impl Iterator<Item = (ToolNumber, ToolPosition)> + '_ {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, p)| (ToolNumber::new(i as i32 + 1), *p))
    }
}
