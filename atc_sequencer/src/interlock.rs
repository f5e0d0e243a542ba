//! Actuator interlock controller.
//!
//! Owns the chuck and rack outputs for the duration of a cycle. Every
//! command is a single output write followed by a dwell that is never
//! shorter than the actuator's minimum settle time.
//!
//! Decisions are taken on sensed state only. The sensor input is the ground
//! truth; an operator may have forced the chuck open by hand.

use atc_common::changer::config::{ActuatorIoConfig, TimingConfig};
use atc_common::machine::driver::{MachineControl, MachineError, OperatorConsole};
use atc_common::machine::types::{Actuator, OperatorResponse};
use atc_common::tool::ToolNumber;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::budget::CycleTimeBudget;
use crate::monitor::InterruptionMonitor;

/// Result of pre-flight actuator normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeOutcome {
    /// Actuators are in a known state; the main sequence may start.
    Ready,
    /// Chuck was open with a tool recorded. The chuck was closed and the
    /// tool reset to none; the operator must invoke the change again.
    ResetRequired,
    /// Operator declined the chuck reset.
    ResetDeclined,
    /// Stop signal observed during normalization.
    Interrupted,
}

/// Chuck and rack command/feedback owner.
#[derive(Debug, Clone)]
pub struct ActuatorController {
    io: ActuatorIoConfig,
    timing: TimingConfig,
}

impl ActuatorController {
    pub fn new(io: &ActuatorIoConfig, timing: &TimingConfig) -> Self {
        Self {
            io: io.clone(),
            timing: timing.clone(),
        }
    }

    /// Read physical feedback, independent of command history.
    pub fn sensed<M: MachineControl + ?Sized>(&self, machine: &M, actuator: Actuator) -> bool {
        machine.read_input(self.io.sensor(actuator))
    }

    /// Write the output without dwelling. The caller owns the settle time.
    pub fn command<M: MachineControl + ?Sized>(
        &self,
        machine: &mut M,
        actuator: Actuator,
        engaged: bool,
    ) {
        let point = self.io.output(actuator);
        info!(%actuator, engaged, %point, "actuator command");
        machine.write_output(point, engaged);
    }

    /// Write the output and dwell for `max(dwell, minimum settle)`.
    ///
    /// Returns the time actually waited.
    pub fn actuate<M: MachineControl + ?Sized>(
        &self,
        machine: &mut M,
        actuator: Actuator,
        engaged: bool,
        dwell: Duration,
    ) -> Duration {
        self.command(machine, actuator, engaged);
        let settle = dwell.max(self.timing.actuator_settle(actuator));
        machine.wait(settle);
        settle
    }

    pub fn open_chuck<M: MachineControl + ?Sized>(&self, machine: &mut M, dwell: Duration) -> Duration {
        self.actuate(machine, Actuator::Chuck, true, dwell)
    }

    pub fn close_chuck<M: MachineControl + ?Sized>(&self, machine: &mut M, dwell: Duration) -> Duration {
        self.actuate(machine, Actuator::Chuck, false, dwell)
    }

    /// Extend the rack and wait for full travel.
    pub fn extend_rack<M: MachineControl + ?Sized>(&self, machine: &mut M) -> Duration {
        self.actuate(machine, Actuator::Rack, true, Duration::ZERO)
    }

    /// Retract the rack and wait for full travel.
    pub fn retract_rack<M: MachineControl + ?Sized>(&self, machine: &mut M) -> Duration {
        self.actuate(machine, Actuator::Rack, false, Duration::ZERO)
    }

    /// Bring the actuators into a known state before any tool motion.
    ///
    /// 1. Rack sensed extended: retract it, pause briefly and raise the
    ///    budget floor to the full rack travel.
    /// 2. Tool recorded but chuck sensed open: ask the operator, force the
    ///    chuck closed and reset the recorded tool to none.
    ///
    /// # Errors
    /// Propagates a failure to persist the tool reset.
    pub fn normalize<M, O>(
        &self,
        machine: &mut M,
        operator: &mut O,
        monitor: &mut InterruptionMonitor,
        budget: &mut CycleTimeBudget,
        current: ToolNumber,
    ) -> Result<NormalizeOutcome, MachineError>
    where
        M: MachineControl + ?Sized,
        O: OperatorConsole + ?Sized,
    {
        if self.sensed(machine, Actuator::Rack) {
            warn!("Rack sensed extended before cycle start");
            operator.notify("Tool rack extended, retracting.");
            if monitor.check(machine) {
                return Ok(NormalizeOutcome::Interrupted);
            }
            self.command(machine, Actuator::Rack, false);
            let pause = self.timing.rack_precheck();
            machine.wait(pause);
            budget.elapse(pause);
            budget.require(self.timing.rack_travel());
            debug!(remaining = ?budget.remaining(), "Rack retracting, budget raised");
        }

        if !current.is_none() && self.sensed(machine, Actuator::Chuck) {
            warn!(%current, "Chuck sensed open while a tool is recorded");
            let response = operator.confirm(&format!(
                "Chuck open (no tool), tool set to {current}. Click OK to reset the ATC or Cancel to stop."
            ));
            if response == OperatorResponse::Cancel {
                return Ok(NormalizeOutcome::ResetDeclined);
            }
            if monitor.check(machine) {
                return Ok(NormalizeOutcome::Interrupted);
            }
            machine.wait(self.timing.chuck_reset_pre());
            self.close_chuck(machine, self.timing.chuck_reset_close());
            machine.commit_current_tool(ToolNumber::NONE)?;
            info!("ATC reset, current tool set to 0");
            return Ok(NormalizeOutcome::ResetRequired);
        }

        Ok(NormalizeOutcome::Ready)
    }
}
