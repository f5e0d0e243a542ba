//! ReleaseOldTool phase: empty chuck, rack eject or manual removal.

use atc_common::machine::driver::{MachineControl, OperatorConsole};
use atc_common::machine::types::{Actuator, MotionCommand};
use atc_common::tool::ToolNumber;
use tracing::info;

use super::{Cycle, Phase, Transition};
use crate::error::SequenceError;
use crate::report::AbortReason;
use crate::slot_map::ToolPosition;

const PHASE: Phase = Phase::ReleaseOldTool;
const NEXT: Transition = Transition::Continue(Phase::AcquireNewTool);

impl<M, O> Cycle<'_, M, O>
where
    M: MachineControl + ?Sized,
    O: OperatorConsole + ?Sized,
{
    pub(super) fn release_old_tool(&mut self) -> Result<Transition, SequenceError> {
        let current = self.from;
        if current.is_none() {
            return self.open_empty_chuck();
        }
        match self.slots.position(current) {
            Some(slot) => {
                info!(%current, "Ejecting tool into rack");
                self.rack_eject(slot)
            }
            None => {
                info!(%current, "Tool is not rack resident, manual removal");
                self.manual_removal(current)
            }
        }
    }

    fn open_empty_chuck(&mut self) -> Result<Transition, SequenceError> {
        self.operator.notify("No tool in chuck, opening chuck.");
        let dwell = self.config.timing.empty_chuck_open();
        let waited = self.interlock.open_chuck(&mut self.machine, dwell);
        self.budget.elapse(waited);
        self.settle(PHASE)?;
        Ok(NEXT)
    }

    fn rack_eject(&mut self, slot: ToolPosition) -> Result<Transition, SequenceError> {
        let config = self.config;
        let heights = &config.heights;

        // XY must be reached before Z goes down into the rack.
        self.motion(MotionCommand::rapid_xy(slot.x, slot.y));
        self.settle(PHASE)?;
        self.motion(MotionCommand::rapid_z(heights.tool_release_z));
        self.settle(PHASE)?;

        self.interlock.extend_rack(&mut self.machine);
        // Stud must be free of the chuck before Z rises.
        self.interlock
            .open_chuck(&mut self.machine, config.timing.strain_relief());

        self.motion(MotionCommand::feed_z(heights.eject_z(), config.motion.feed_rate_z));
        self.dwell(config.timing.eject_settle());
        self.settle(PHASE)?;

        self.motion(MotionCommand::rapid_z(heights.travel_z()));
        self.settle(PHASE)?;

        self.commit(PHASE, ToolNumber::NONE)?;
        Ok(NEXT)
    }

    fn manual_removal(&mut self, current: ToolNumber) -> Result<Transition, SequenceError> {
        let config = self.config;
        let cancelled = Transition::Aborted(AbortReason::ManualRemovalCancelled);

        if !self.confirm(&format!(
            "Tool {current} is not in the ATC rack. Click OK to begin the manual removal process."
        )) {
            return Ok(cancelled);
        }

        // Z follows XY so the spindle never descends off position.
        self.motion(MotionCommand::rapid_xy(config.park.x, config.park.y));
        self.settle(PHASE)?;
        self.motion(MotionCommand::rapid_z(config.park.z));
        self.settle(PHASE)?;

        if !self.confirm(
            "When you are ready to release the tool, click OK. MAKE SURE YOU ARE HOLDING THE TOOL THAT IS IN THE CHUCK.",
        ) {
            return Ok(cancelled);
        }
        // Operator may have pressed stop while the dialog was open.
        if self.checkpoint() {
            return Ok(Transition::Interrupted);
        }

        self.interlock.open_chuck(
            &mut self.machine,
            config.timing.actuator_settle(Actuator::Chuck),
        );

        if !self.confirm("Verify that tool is released from the spindle. Select OK to continue.") {
            return Ok(cancelled);
        }

        self.commit(PHASE, ToolNumber::NONE)?;
        Ok(NEXT)
    }
}
