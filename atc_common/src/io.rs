//! Digital I/O points and axis homing flags.

use bitflags::bitflags;
use core::fmt;
use serde::{Deserialize, Serialize};

// ─── IoPoint ────────────────────────────────────────────────────────

/// A digital I/O point addressed by controller port and pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IoPoint {
    pub port: u8,
    pub pin: u8,
}

impl IoPoint {
    #[inline]
    pub const fn new(port: u8, pin: u8) -> Self {
        Self { port, pin }
    }
}

impl fmt::Display for IoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}.{}", self.port, self.pin)
    }
}

// ─── HomedAxes ──────────────────────────────────────────────────────

bitflags! {
    /// Axes whose machine coordinates have been referenced.
    ///
    /// Absolute (G53) motion is only safe when all three are set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HomedAxes: u8 {
        const X = 0x01;
        const Y = 0x02;
        const Z = 0x04;
    }
}

impl HomedAxes {
    /// Returns true if X, Y and Z are all referenced.
    #[inline]
    pub const fn is_fully_homed(&self) -> bool {
        self.contains(Self::all())
    }

    /// Axes that still need homing.
    #[inline]
    pub const fn missing(&self) -> Self {
        Self::all().difference(*self)
    }

    /// Comma separated axis letters, e.g. `"X, Z"`.
    pub fn axis_names(&self) -> String {
        let mut names = Vec::with_capacity(3);
        if self.contains(Self::X) {
            names.push("X");
        }
        if self.contains(Self::Y) {
            names.push("Y");
        }
        if self.contains(Self::Z) {
            names.push("Z");
        }
        names.join(", ")
    }
}

impl Default for HomedAxes {
    fn default() -> Self {
        Self::empty()
    }
}
