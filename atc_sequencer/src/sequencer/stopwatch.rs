//! Machine wrapper that accumulates blocking wait time.
//!
//! Every suspension point of a cycle goes through `MachineControl::wait`,
//! so summing those calls yields the time the cycle spent dwelling and
//! polling, independent of whether the host clock is real or virtual.

use atc_common::io::{HomedAxes, IoPoint};
use atc_common::machine::driver::{MachineControl, MachineError};
use atc_common::machine::types::{AxisPosition, MotionCommand};
use atc_common::tool::ToolNumber;
use std::time::Duration;

pub(crate) struct Stopwatch<'m, M: ?Sized> {
    inner: &'m mut M,
    elapsed: Duration,
}

impl<'m, M: MachineControl + ?Sized> Stopwatch<'m, M> {
    pub(crate) fn new(inner: &'m mut M) -> Self {
        Self {
            inner,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl<M: MachineControl + ?Sized> MachineControl for Stopwatch<'_, M> {
    fn homed_axes(&self) -> HomedAxes {
        self.inner.homed_axes()
    }

    fn machine_position(&self) -> AxisPosition {
        self.inner.machine_position()
    }

    fn current_tool(&self) -> ToolNumber {
        self.inner.current_tool()
    }

    fn requested_tool(&self) -> ToolNumber {
        self.inner.requested_tool()
    }

    fn spindle_running(&self) -> bool {
        self.inner.spindle_running()
    }

    fn stop_spindle(&mut self) {
        self.inner.stop_spindle();
    }

    fn read_input(&self, point: IoPoint) -> bool {
        self.inner.read_input(point)
    }

    fn write_output(&mut self, point: IoPoint, value: bool) {
        self.inner.write_output(point, value);
    }

    fn issue_motion(&mut self, command: &MotionCommand) {
        self.inner.issue_motion(command);
    }

    fn is_moving(&self) -> bool {
        self.inner.is_moving()
    }

    fn wait(&mut self, duration: Duration) {
        self.elapsed += duration;
        self.inner.wait(duration);
    }

    fn cycle_interrupted(&self) -> bool {
        self.inner.cycle_interrupted()
    }

    fn halt_with_deceleration(&mut self) {
        self.inner.halt_with_deceleration();
    }

    fn hard_stop(&mut self) {
        self.inner.hard_stop();
    }

    fn commit_current_tool(&mut self, tool: ToolNumber) -> Result<(), MachineError> {
        self.inner.commit_current_tool(tool)
    }
}
