//! AcquireNewTool phase: rack pickup or manual placement.

use atc_common::machine::driver::{MachineControl, OperatorConsole};
use atc_common::machine::types::{Actuator, MotionCommand};
use tracing::{debug, info};

use super::{Cycle, Phase, Transition};
use crate::error::SequenceError;
use crate::report::AbortReason;
use crate::slot_map::ToolPosition;

const PHASE: Phase = Phase::AcquireNewTool;
const NEXT: Transition = Transition::Continue(Phase::ReturnToOrigin);

impl<M, O> Cycle<'_, M, O>
where
    M: MachineControl + ?Sized,
    O: OperatorConsole + ?Sized,
{
    pub(super) fn acquire_new_tool(&mut self) -> Result<Transition, SequenceError> {
        let requested = self.to;
        match self.slots.position(requested) {
            Some(slot) => {
                info!(%requested, "Picking up tool from rack");
                self.rack_pickup(slot)
            }
            None => {
                info!(%requested, "Tool is not rack resident, manual placement");
                self.manual_placement()
            }
        }
    }

    fn rack_pickup(&mut self, slot: ToolPosition) -> Result<Transition, SequenceError> {
        let config = self.config;
        let heights = &config.heights;

        self.motion(MotionCommand::rapid_xy(slot.x, slot.y));
        self.settle(PHASE)?;

        // Nothing was ejected this cycle, so the rack may still be home.
        if !self.interlock.sensed(&self.machine, Actuator::Rack) {
            debug!("Rack not extended, extending before descent");
            self.interlock.extend_rack(&mut self.machine);
        }

        self.motion(MotionCommand::rapid_z(heights.engage_approach_z()));
        self.settle(PHASE)?;

        self.interlock
            .close_chuck(&mut self.machine, config.timing.engage_dwell());
        self.motion(MotionCommand::feed_z(heights.tool_release_z, config.motion.feed_rate_z));
        self.dwell(config.timing.engage_settle());
        self.settle(PHASE)?;

        self.commit(PHASE, self.to)?;

        self.interlock.retract_rack(&mut self.machine);
        // The retract must reach safe Z before a stop can halt the axes.
        self.motion(MotionCommand::rapid_z(heights.safe_z));
        self.settle(PHASE)?;
        Ok(NEXT)
    }

    fn manual_placement(&mut self) -> Result<Transition, SequenceError> {
        let config = self.config;
        let cancelled = Transition::Aborted(AbortReason::ManualLoadCancelled);

        if self.interlock.sensed(&self.machine, Actuator::Rack) {
            self.interlock.retract_rack(&mut self.machine);
        } else {
            self.interlock.command(&mut self.machine, Actuator::Rack, false);
        }
        self.motion(MotionCommand::rapid_z(config.heights.safe_z));
        self.settle(PHASE)?;

        self.motion(MotionCommand::rapid_xy(config.park.x, config.park.y));
        self.settle(PHASE)?;
        self.motion(MotionCommand::rapid_z(config.park.z));
        self.settle(PHASE)?;

        if !self.confirm("Place tool into chuck. Click OK when you are ready to continue.") {
            return Ok(cancelled);
        }
        if self.checkpoint() {
            return Ok(Transition::Interrupted);
        }

        self.interlock
            .close_chuck(&mut self.machine, config.timing.engage_dwell());

        if !self.confirm("Verify that tool is in the spindle. Select OK to continue.") {
            return Ok(cancelled);
        }

        self.commit(PHASE, self.to)?;
        Ok(NEXT)
    }
}
