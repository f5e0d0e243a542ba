//! Tool-change state machine.
//!
//! A cycle walks a fixed list of phases. Each phase handler returns a
//! [`Transition`] instead of returning early from a flat procedure, and the
//! stop signal is sampled at every phase boundary.
//!
//! ```text
//! SafetyCheck → StopSpindle → NormalizeActuators → RetractToSafeZ
//!   → ReleaseOldTool [rack eject | manual removal | empty chuck]
//!   → AcquireNewTool [rack pickup | manual placement]
//!   → ReturnToOrigin → ReloadToolOffset → Finish
//! ```
//!
//! # Commands
//!
//! Exactly one hardware command is in flight at a time. Every motion is
//! followed by a bounded settle before the next command that depends on
//! it. The only blocking points are `wait()` and the settle poll.

mod acquire;
mod release;
mod stopwatch;

use atc_common::changer::config::AtcConfig;
use atc_common::machine::driver::{MachineControl, OperatorConsole};
use atc_common::machine::types::{AxisPosition, MotionCommand, OperatorResponse};
use atc_common::tool::ToolNumber;
use core::fmt;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::budget::CycleTimeBudget;
use crate::error::SequenceError;
use crate::gate::{GateDecision, SafetyGate};
use crate::interlock::{ActuatorController, NormalizeOutcome};
use crate::monitor::InterruptionMonitor;
use crate::report::{AbortReason, CycleOutcome, CycleReport};
use crate::slot_map::ToolSlotMap;
use stopwatch::Stopwatch;

// ─── Phases ─────────────────────────────────────────────────────────

/// Phase of a tool-change cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    SafetyCheck,
    StopSpindle,
    NormalizeActuators,
    RetractToSafeZ,
    ReleaseOldTool,
    AcquireNewTool,
    ReturnToOrigin,
    ReloadToolOffset,
    Finish,
}

impl Phase {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SafetyCheck => "safety check",
            Self::StopSpindle => "stop spindle",
            Self::NormalizeActuators => "normalize actuators",
            Self::RetractToSafeZ => "retract to safe Z",
            Self::ReleaseOldTool => "release old tool",
            Self::AcquireNewTool => "acquire new tool",
            Self::ReturnToOrigin => "return to origin",
            Self::ReloadToolOffset => "reload tool offset",
            Self::Finish => "finish",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a single phase handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Advance to the given phase.
    Continue(Phase),
    /// Operator cancelled; nothing further is commanded.
    Aborted(AbortReason),
    /// Stop signal observed inside the phase.
    Interrupted,
    /// Cycle ends here with the given outcome.
    Finished(CycleOutcome),
}

// ─── Sequencer ──────────────────────────────────────────────────────

/// Runs tool-change cycles against a configured rack.
///
/// Holds only immutable configuration; all per-cycle state lives in the
/// cycle and is dropped when `run` returns. Invocations must be serialized
/// by the caller.
#[derive(Debug, Clone)]
pub struct Sequencer<'a> {
    config: &'a AtcConfig,
    slots: &'a ToolSlotMap,
    gate: SafetyGate,
}

impl<'a> Sequencer<'a> {
    pub fn new(config: &'a AtcConfig, slots: &'a ToolSlotMap) -> Self {
        Self {
            config,
            slots,
            gate: SafetyGate::new(config.tools.max_total_tool),
        }
    }

    /// Run one tool change from the machine's current to its requested tool.
    ///
    /// Rejections, cancels and interruptions are reported through
    /// [`CycleOutcome`]. A fault issues a hard stop and an operator notice
    /// before it is returned.
    ///
    /// # Errors
    /// [`SequenceError`] if motion does not settle in time or the host
    /// fails to persist the tool number.
    pub fn run<M, O>(&self, machine: &mut M, operator: &mut O) -> Result<CycleReport, SequenceError>
    where
        M: MachineControl + ?Sized,
        O: OperatorConsole + ?Sized,
    {
        let mut cycle = Cycle::new(self, machine, operator);
        info!(from = %cycle.from, to = %cycle.to, "Tool change requested");

        match cycle.drive() {
            Ok(outcome) => {
                info!(?outcome, elapsed = ?cycle.machine.elapsed(), "Tool change finished");
                Ok(cycle.into_report(outcome))
            }
            Err(err) => {
                error!(phase = %err.phase(), "Tool change fault: {err}");
                cycle.machine.hard_stop();
                cycle.operator.notify(&format!("Tool change failed: {err}"));
                Err(err)
            }
        }
    }
}

// ─── Cycle ──────────────────────────────────────────────────────────

/// State owned by one running tool change.
pub(crate) struct Cycle<'c, M: ?Sized, O: ?Sized> {
    config: &'c AtcConfig,
    slots: &'c ToolSlotMap,
    gate: SafetyGate,
    machine: Stopwatch<'c, M>,
    operator: &'c mut O,
    monitor: InterruptionMonitor,
    interlock: ActuatorController,
    budget: CycleTimeBudget,
    from: ToolNumber,
    to: ToolNumber,
    origin: AxisPosition,
    phases: Vec<Phase>,
}

impl<'c, M, O> Cycle<'c, M, O>
where
    M: MachineControl + ?Sized,
    O: OperatorConsole + ?Sized,
{
    fn new(sequencer: &Sequencer<'c>, machine: &'c mut M, operator: &'c mut O) -> Self {
        let config = sequencer.config;
        let from = machine.current_tool();
        let to = machine.requested_tool();
        Self {
            config,
            slots: sequencer.slots,
            gate: sequencer.gate,
            machine: Stopwatch::new(machine),
            operator,
            monitor: InterruptionMonitor::new(&config.motion),
            interlock: ActuatorController::new(&config.io, &config.timing),
            budget: CycleTimeBudget::new(),
            from,
            to,
            origin: AxisPosition::default(),
            phases: Vec::with_capacity(9),
        }
    }

    fn drive(&mut self) -> Result<CycleOutcome, SequenceError> {
        let mut phase = Phase::SafetyCheck;
        loop {
            self.phases.push(phase);
            debug!(%phase, "Entering phase");

            let transition = match phase {
                Phase::SafetyCheck => self.safety_check(),
                Phase::StopSpindle => self.stop_spindle(),
                Phase::NormalizeActuators => self.normalize_actuators()?,
                Phase::RetractToSafeZ => self.retract_to_safe_z()?,
                Phase::ReleaseOldTool => self.release_old_tool()?,
                Phase::AcquireNewTool => self.acquire_new_tool()?,
                Phase::ReturnToOrigin => self.return_to_origin()?,
                Phase::ReloadToolOffset => self.reload_tool_offset()?,
                Phase::Finish => self.finish(),
            };

            match transition {
                Transition::Continue(next) => {
                    if self.checkpoint() {
                        return Ok(self.interrupted());
                    }
                    phase = next;
                }
                Transition::Aborted(reason) => return Ok(self.aborted(reason)),
                Transition::Interrupted => return Ok(self.interrupted()),
                Transition::Finished(outcome) => return Ok(outcome),
            }
        }
    }

    fn into_report(self, outcome: CycleOutcome) -> CycleReport {
        CycleReport {
            outcome,
            from: self.from,
            to: self.to,
            elapsed: self.machine.elapsed(),
            phases: self.phases,
        }
    }

    // ─── Phase handlers ─────────────────────────────────────────────

    fn safety_check(&mut self) -> Transition {
        let homed = self.machine.homed_axes();
        match self.gate.evaluate(self.to, self.from, homed) {
            GateDecision::Proceed => {
                self.origin = self.machine.machine_position();
                debug!(x = self.origin.x, y = self.origin.y, "Origin captured");
                Transition::Continue(Phase::StopSpindle)
            }
            GateDecision::Rejected(rejection) => {
                warn!(?rejection, "Tool change rejected");
                self.operator.notify(&rejection.to_string());
                if rejection.requires_hard_stop() {
                    self.machine.hard_stop();
                }
                Transition::Finished(CycleOutcome::Rejected(rejection))
            }
        }
    }

    fn stop_spindle(&mut self) -> Transition {
        if self.machine.spindle_running() {
            info!("Stopping spindle");
            self.machine.stop_spindle();
            self.budget.require(self.config.timing.spindle_spin_down());
        }
        Transition::Continue(Phase::NormalizeActuators)
    }

    fn normalize_actuators(&mut self) -> Result<Transition, SequenceError> {
        let outcome = self
            .interlock
            .normalize(
                &mut self.machine,
                &mut *self.operator,
                &mut self.monitor,
                &mut self.budget,
                self.from,
            )
            .map_err(|source| SequenceError::Machine {
                phase: Phase::NormalizeActuators,
                source,
            })?;

        Ok(match outcome {
            NormalizeOutcome::Ready => Transition::Continue(Phase::RetractToSafeZ),
            NormalizeOutcome::ResetRequired => {
                self.operator
                    .notify("ATC is reset and tool set to 0. Please run the tool change again.");
                self.machine.hard_stop();
                Transition::Finished(CycleOutcome::ResetRequired)
            }
            NormalizeOutcome::ResetDeclined => Transition::Aborted(AbortReason::ChuckResetDeclined),
            NormalizeOutcome::Interrupted => Transition::Interrupted,
        })
    }

    fn retract_to_safe_z(&mut self) -> Result<Transition, SequenceError> {
        let phase = Phase::RetractToSafeZ;
        self.settle(phase)?;
        self.motion(MotionCommand::rapid_z(self.config.heights.safe_z));

        // Spin-down and rack travel overlap with the Z retract.
        let remaining = self.budget.remaining();
        if !remaining.is_zero() {
            debug!(?remaining, "Waiting out settle budget");
            self.dwell(remaining);
        }
        self.settle(phase)?;
        Ok(Transition::Continue(Phase::ReleaseOldTool))
    }

    fn return_to_origin(&mut self) -> Result<Transition, SequenceError> {
        let phase = Phase::ReturnToOrigin;
        self.settle(phase)?;
        self.motion(MotionCommand::rapid_xy(self.origin.x, self.origin.y));
        self.settle(phase)?;
        Ok(Transition::Continue(Phase::ReloadToolOffset))
    }

    fn reload_tool_offset(&mut self) -> Result<Transition, SequenceError> {
        self.motion(MotionCommand::LoadToolOffset(self.to));
        self.settle(Phase::ReloadToolOffset)?;
        Ok(Transition::Continue(Phase::Finish))
    }

    fn finish(&mut self) -> Transition {
        if self.checkpoint() {
            return Transition::Interrupted;
        }
        Transition::Finished(CycleOutcome::Completed { tool: self.to })
    }

    // ─── Terminal handling ──────────────────────────────────────────

    fn interrupted(&mut self) -> CycleOutcome {
        let current = self.machine.current_tool();
        warn!(%current, "Tool change interrupted");
        self.machine.halt_with_deceleration();
        self.operator.notify("Tool change was interrupted by user!");
        CycleOutcome::Interrupted { current }
    }

    fn aborted(&mut self, reason: AbortReason) -> CycleOutcome {
        warn!(?reason, "Tool change cancelled by operator");
        self.operator.notify("Tool change cancelled by operator.");
        CycleOutcome::Aborted(reason)
    }

    // ─── Command helpers ────────────────────────────────────────────

    fn checkpoint(&mut self) -> bool {
        self.monitor.check(&self.machine)
    }

    fn motion(&mut self, command: MotionCommand) {
        info!(%command, "Motion");
        self.machine.issue_motion(&command);
    }

    /// Bounded settle; the time spent counts against the budget.
    fn settle(&mut self, phase: Phase) -> Result<(), SequenceError> {
        let waited = self.monitor.await_settle(&mut self.machine, phase)?;
        self.budget.elapse(waited);
        Ok(())
    }

    fn dwell(&mut self, duration: Duration) {
        self.machine.wait(duration);
        self.budget.elapse(duration);
    }

    /// Blocking operator confirmation. `false` means cancelled.
    fn confirm(&mut self, message: &str) -> bool {
        let response = self.operator.confirm(message);
        debug!(?response, "Operator answered");
        response == OperatorResponse::Proceed
    }

    /// Persist the tool number unless a stop was observed.
    fn commit(&mut self, phase: Phase, tool: ToolNumber) -> Result<bool, SequenceError> {
        if self.checkpoint() {
            warn!(%phase, %tool, "Tool number commit skipped after stop");
            return Ok(false);
        }
        self.machine
            .commit_current_tool(tool)
            .map_err(|source| SequenceError::Machine { phase, source })?;
        info!(%phase, %tool, "Current tool committed");
        Ok(true)
    }
}
