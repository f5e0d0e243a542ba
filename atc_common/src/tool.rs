//! Tool numbering.
//!
//! A `ToolNumber` is the integer the host reports for "tool in spindle" and
//! "requested tool". Two sentinels share the domain: `0` (no tool loaded)
//! and `-1` (the T word was missing from the program).

use core::fmt;
use serde::{Deserialize, Serialize};

/// Tool identifier as reported by the host controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolNumber(i32);

impl ToolNumber {
    /// Empty spindle.
    pub const NONE: Self = Self(0);
    /// Missing T code. Never a valid machine state.
    pub const MISSING: Self = Self(-1);

    #[inline]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_missing(self) -> bool {
        self.0 == -1
    }

    /// Classify against a rack holding `rack_slots` tools.
    ///
    /// Tools `1..=rack_slots` live in the rack. Anything above is handled
    /// manually. Negative numbers are never valid for a change.
    pub const fn classify(self, rack_slots: u8) -> ToolClass {
        match self.0 {
            0 => ToolClass::Empty,
            n if n < 0 => ToolClass::Invalid,
            n if n <= rack_slots as i32 => ToolClass::RackResident(n as u8),
            _ => ToolClass::Overflow,
        }
    }
}

impl From<i32> for ToolNumber {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ToolNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rack classification of a tool number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolClass {
    /// No tool (`ToolNumber::NONE`).
    Empty,
    /// Stored in the rack at the given 1-based slot.
    RackResident(u8),
    /// Beyond rack capacity; handled by the operator at the park position.
    Overflow,
    /// Negative tool number (missing code or garbage).
    Invalid,
}
