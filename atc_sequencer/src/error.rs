//! Sequencer fault types.
//!
//! Rejections, operator cancels and interruptions are regular outcomes
//! (see [`crate::report::CycleOutcome`]). `SequenceError` is reserved for
//! faults where the machine did not behave as commanded.

use atc_common::machine::driver::MachineError;
use std::time::Duration;
use thiserror::Error;

use crate::sequencer::Phase;

/// Fault raised while running a tool-change cycle.
#[derive(Debug, Clone, Error)]
pub enum SequenceError {
    /// A move did not settle within the configured timeout.
    #[error("motion did not settle within {waited:?} during {phase}")]
    MotionTimeout { phase: Phase, waited: Duration },

    /// The host rejected an operation.
    #[error("machine error during {phase}: {source}")]
    Machine {
        phase: Phase,
        #[source]
        source: MachineError,
    },
}

impl SequenceError {
    /// Phase in which the fault occurred.
    pub const fn phase(&self) -> Phase {
        match self {
            Self::MotionTimeout { phase, .. } | Self::Machine { phase, .. } => *phase,
        }
    }
}
