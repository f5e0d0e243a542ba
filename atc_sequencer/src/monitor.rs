//! Interruption monitor and bounded motion settle.
//!
//! The operator's stop signal is sampled at explicit checkpoints only
//! (phase boundaries, before every tool-number commit, after a manual
//! handling dialog that precedes a chuck command, at cycle end). Once
//! observed it stays latched for the rest of the cycle, even if the host
//! clears its flag.
//!
//! Motion settle polls `is_moving()` at a fixed interval. Unlike a bare spin
//! loop it gives up after the configured timeout with a distinct error.

use atc_common::changer::config::MotionConfig;
use atc_common::machine::driver::MachineControl;
use std::time::Duration;
use tracing::{trace, warn};

use crate::error::SequenceError;
use crate::sequencer::Phase;

/// Latched stop-signal observer plus motion settle helper.
#[derive(Debug, Clone)]
pub struct InterruptionMonitor {
    poll: Duration,
    timeout: Duration,
    tripped: bool,
}

impl InterruptionMonitor {
    pub fn new(motion: &MotionConfig) -> Self {
        Self {
            poll: motion.settle_poll(),
            timeout: motion.settle_timeout(),
            tripped: false,
        }
    }

    /// Sample the stop signal. Returns true if it is (or ever was) raised.
    pub fn check<M: MachineControl + ?Sized>(&mut self, machine: &M) -> bool {
        if !self.tripped && machine.cycle_interrupted() {
            warn!("Stop signal observed, cycle will not advance further");
            self.tripped = true;
        }
        self.tripped
    }

    /// Block until all axes report standstill.
    ///
    /// Returns the time spent polling so callers can credit it against the
    /// settle budget.
    ///
    /// # Errors
    /// `SequenceError::MotionTimeout` if motion is still reported after
    /// the configured timeout.
    pub fn await_settle<M: MachineControl + ?Sized>(
        &self,
        machine: &mut M,
        phase: Phase,
    ) -> Result<Duration, SequenceError> {
        let mut waited = Duration::ZERO;
        while machine.is_moving() {
            if waited >= self.timeout {
                return Err(SequenceError::MotionTimeout { phase, waited });
            }
            machine.wait(self.poll);
            waited += self.poll;
        }
        trace!(?phase, ?waited, "motion settled");
        Ok(waited)
    }
}
