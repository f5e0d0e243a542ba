//! Machine safety gate.
//!
//! Decides whether a tool change may start at all. Runs before any
//! actuator or motion command and has no side effects of its own; the
//! sequencer acts on the decision.
//!
//! Rejections are checked in a fixed priority order:
//!
//! | # | Condition                         | Reaction                 |
//! |---|-----------------------------------|--------------------------|
//! | 1 | requested == current              | reject                   |
//! | 2 | requested is the missing-code     | reject                   |
//! | 3 | requested outside `1..=max_total` | reject                   |
//! | 4 | X, Y or Z not homed               | reject + hard stop       |

use atc_common::io::HomedAxes;
use atc_common::tool::ToolNumber;
use serde::Serialize;
use core::fmt;

/// Reason a tool change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rejection {
    /// The requested tool is already in the spindle.
    SameTool(ToolNumber),
    /// The program issued M6 without a T word.
    MissingCode,
    /// Requested tool outside `1..=max`.
    OutOfRange { tool: ToolNumber, max: i32 },
    /// Machine coordinates are not referenced.
    NotHomed { missing: u8 },
}

impl Rejection {
    /// Only an unhomed machine warrants stopping the program outright.
    #[inline]
    pub const fn requires_hard_stop(&self) -> bool {
        matches!(self, Self::NotHomed { .. })
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameTool(_) => write!(f, "Tool change failed, same tool was selected!"),
            Self::MissingCode => write!(f, "Tool change failed, T code is missing!"),
            Self::OutOfRange { tool, max } => write!(
                f,
                "Tool change to {tool} failed, new tool number is out of range! (Min: 1, Max: {max})"
            ),
            Self::NotHomed { missing } => write!(
                f,
                "The machine was not yet homed ({} not referenced), do homing before executing a tool change!",
                HomedAxes::from_bits_truncate(*missing).axis_names()
            ),
        }
    }
}

/// Outcome of the safety gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Rejected(Rejection),
}

/// Pre-cycle validation of tool numbers and homing state.
#[derive(Debug, Clone, Copy)]
pub struct SafetyGate {
    max_total_tool: i32,
}

impl SafetyGate {
    pub const fn new(max_total_tool: i32) -> Self {
        Self { max_total_tool }
    }

    /// Evaluate the gate for one invocation.
    pub fn evaluate(
        &self,
        requested: ToolNumber,
        current: ToolNumber,
        homed: HomedAxes,
    ) -> GateDecision {
        if requested == current {
            return GateDecision::Rejected(Rejection::SameTool(requested));
        }
        if requested.is_missing() {
            return GateDecision::Rejected(Rejection::MissingCode);
        }
        if requested.get() < 1 || requested.get() > self.max_total_tool {
            return GateDecision::Rejected(Rejection::OutOfRange {
                tool: requested,
                max: self.max_total_tool,
            });
        }
        if !homed.is_fully_homed() {
            return GateDecision::Rejected(Rejection::NotHomed {
                missing: homed.missing().bits(),
            });
        }
        GateDecision::Proceed
    }
}
