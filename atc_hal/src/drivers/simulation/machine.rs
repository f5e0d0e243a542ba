//! Simulated host controller.
//!
//! `SimulatedMachine` implements `MachineControl` on a virtual clock that
//! only advances inside `wait()`. Settle polls therefore cost no real time
//! and cycles are reproducible.

use atc_common::changer::config::ActuatorIoConfig;
use atc_common::io::{HomedAxes, IoPoint};
use atc_common::machine::driver::{MachineControl, MachineError};
use atc_common::machine::types::{AxisPosition, MotionCommand};
use atc_common::tool::ToolNumber;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::axes::MotionSimulator;
use super::config::SimulationConfig;
use super::io::{IoSimulator, LinkedInput};
use super::state::{PersistedState, StatePersistence};

/// How program execution was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltKind {
    /// Controlled deceleration.
    Decelerated,
    /// Immediate stop.
    Hard,
}

/// Software host controller for development and testing.
#[derive(Debug)]
pub struct SimulatedMachine {
    clock: Duration,
    io: IoSimulator,
    axes: MotionSimulator,
    homed: HomedAxes,
    spindle_running: bool,
    current_tool: ToolNumber,
    requested_tool: ToolNumber,
    interrupt: Arc<AtomicBool>,
    interrupt_at: Option<Duration>,
    halted: Option<HaltKind>,
    history: Vec<MotionCommand>,
    persistence: Option<StatePersistence>,
}

impl SimulatedMachine {
    /// Create a machine with sensors wired to follow their outputs.
    pub fn new(config: &SimulationConfig, io_config: &ActuatorIoConfig) -> Self {
        let mut io = IoSimulator::new();
        let links = [
            (
                io_config.chuck_output,
                io_config.chuck_sensor,
                config.chuck_sensor_delay_ms,
            ),
            (
                io_config.rack_output,
                io_config.rack_sensor,
                config.rack_sensor_delay_ms,
            ),
        ];
        for (output, sensor, delay_ms) in links {
            for reaction in LinkedInput::follow(sensor, Duration::from_millis(delay_ms)) {
                io.link(output, reaction);
            }
        }

        let homed = if config.homed {
            HomedAxes::all()
        } else {
            HomedAxes::empty()
        };

        debug!(?homed, start = ?config.start_position, "Simulated machine created");

        Self {
            clock: Duration::ZERO,
            io,
            axes: MotionSimulator::new(config.start_position, config.rapid_speed),
            homed,
            spindle_running: false,
            current_tool: ToolNumber::NONE,
            requested_tool: ToolNumber::NONE,
            interrupt: Arc::new(AtomicBool::new(false)),
            interrupt_at: None,
            halted: None,
            history: Vec::new(),
            persistence: None,
        }
    }

    /// Persist the current tool in `path`, restoring it if the file exists.
    pub fn with_state_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, MachineError> {
        let persistence = StatePersistence::new(path);
        if let Some(state) = persistence.load()? {
            self.current_tool = state.current_tool;
        }
        self.persistence = Some(persistence);
        Ok(self)
    }

    // ─── Scenario setup ─────────────────────────────────────────────

    /// Set the tool recorded in the spindle without persisting it.
    pub fn set_current_tool(&mut self, tool: ToolNumber) {
        self.current_tool = tool;
    }

    /// Set the tool the running program asks for.
    pub fn request_tool(&mut self, tool: ToolNumber) {
        self.requested_tool = tool;
    }

    /// Start or stop the spindle.
    pub fn set_spindle_running(&mut self, running: bool) {
        self.spindle_running = running;
    }

    /// Override the homing flags.
    pub fn set_homed(&mut self, homed: HomedAxes) {
        self.homed = homed;
    }

    /// Force a sensor input only, as if the actuator was moved by hand.
    pub fn force_input(&mut self, input: IoPoint, state: bool) {
        self.io.set_input(input, state);
    }

    /// Shared stop flag, e.g. for a Ctrl-C handler.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Raise the stop flag once the virtual clock reaches `at`.
    pub fn interrupt_at(&mut self, at: Duration) {
        self.interrupt_at = Some(at);
    }

    // ─── Inspection ─────────────────────────────────────────────────

    /// Virtual time since creation.
    pub fn now(&self) -> Duration {
        self.clock
    }

    /// Interpolated XYZ position.
    pub fn position(&self) -> [f64; 3] {
        self.axes.position(self.clock)
    }

    /// Every motion command issued so far.
    pub fn history(&self) -> &[MotionCommand] {
        &self.history
    }

    /// How execution was stopped, if it was.
    pub fn halted(&self) -> Option<HaltKind> {
        self.halted
    }

    /// Tool offset loaded by the last `G43`.
    pub fn loaded_offset(&self) -> Option<ToolNumber> {
        self.axes.loaded_offset()
    }

    /// Last written state of an output.
    pub fn output(&self, point: IoPoint) -> bool {
        self.io.output(point)
    }

    fn poll_scripted_interrupt(&mut self) {
        if let Some(at) = self.interrupt_at {
            if self.clock >= at {
                info!(at = ?at, "Scripted stop signal raised");
                self.interrupt.store(true, Ordering::SeqCst);
                self.interrupt_at = None;
            }
        }
    }
}

impl MachineControl for SimulatedMachine {
    fn homed_axes(&self) -> HomedAxes {
        self.homed
    }

    fn machine_position(&self) -> AxisPosition {
        let [x, y, _] = self.position();
        AxisPosition::new(x, y)
    }

    fn current_tool(&self) -> ToolNumber {
        self.current_tool
    }

    fn requested_tool(&self) -> ToolNumber {
        self.requested_tool
    }

    fn spindle_running(&self) -> bool {
        self.spindle_running
    }

    fn stop_spindle(&mut self) {
        debug!("M5");
        self.spindle_running = false;
    }

    fn read_input(&self, point: IoPoint) -> bool {
        self.io.input(point)
    }

    fn write_output(&mut self, point: IoPoint, value: bool) {
        self.io.write(point, value, self.clock);
    }

    fn issue_motion(&mut self, command: &MotionCommand) {
        debug!(%command, at = ?self.clock, "Motion issued");
        self.axes.issue(command, self.clock);
        self.history.push(*command);
    }

    fn is_moving(&self) -> bool {
        self.axes.is_moving(self.clock)
    }

    fn wait(&mut self, duration: Duration) {
        self.clock += duration;
        self.io.advance(self.clock);
        self.poll_scripted_interrupt();
    }

    fn cycle_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }

    fn halt_with_deceleration(&mut self) {
        info!("Program stopped with deceleration");
        self.axes.halt(self.clock);
        self.halted = Some(HaltKind::Decelerated);
    }

    fn hard_stop(&mut self) {
        warn!("Program hard stopped");
        self.axes.halt(self.clock);
        self.halted = Some(HaltKind::Hard);
    }

    fn commit_current_tool(&mut self, tool: ToolNumber) -> Result<(), MachineError> {
        if let Some(persistence) = &self.persistence {
            persistence.save(&PersistedState::new(tool))?;
        }
        self.current_tool = tool;
        Ok(())
    }
}
