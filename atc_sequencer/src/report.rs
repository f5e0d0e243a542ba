//! Cycle outcome and report.

use atc_common::tool::ToolNumber;
use serde::Serialize;
use std::time::Duration;

use crate::gate::Rejection;
use crate::sequencer::Phase;

/// Why the operator ended a cycle early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AbortReason {
    /// Cancel at one of the manual removal confirmations.
    ManualRemovalCancelled,
    /// Cancel at one of the overflow load confirmations.
    ManualLoadCancelled,
    /// Cancel at the chuck reset prompt.
    ChuckResetDeclined,
}

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CycleOutcome {
    /// Requested tool is now in the spindle and its offset loaded.
    Completed { tool: ToolNumber },
    /// Safety gate refused the change before any command was issued.
    Rejected(Rejection),
    /// Operator cancelled.
    Aborted(AbortReason),
    /// Stop signal observed. `current` is the recorded tool afterwards.
    Interrupted { current: ToolNumber },
    /// Actuator bookkeeping was reset; the change must be run again.
    ResetRequired,
}

impl CycleOutcome {
    #[inline]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Summary of one tool-change invocation.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub from: ToolNumber,
    pub to: ToolNumber,
    /// Phases entered, in order.
    pub phases: Vec<Phase>,
    /// Total time the cycle spent in dwells and settle polls.
    #[serde(with = "millis")]
    pub elapsed: Duration,
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}
