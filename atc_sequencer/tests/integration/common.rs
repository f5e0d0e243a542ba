//! Recording test bench shared by the integration scenarios.
//!
//! `RecordingMachine` and `RecordingConsole` append to one journal so the
//! relative order of hardware commands and operator dialogs can be
//! asserted. Outputs are mirrored to their sensors instantly unless a
//! sensor is pinned.

use atc_common::io::{HomedAxes, IoPoint};
use atc_common::machine::driver::{MachineControl, MachineError, OperatorConsole};
use atc_common::machine::types::{AxisPosition, MotionCommand, OperatorResponse};
use atc_common::tool::ToolNumber;
use atc_sequencer::config::{LoadedConfig, load_config_from_str};
use atc_sequencer::{CycleReport, SequenceError, Sequencer};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

pub const CHUCK: IoPoint = IoPoint::new(1, 14);
pub const RACK: IoPoint = IoPoint::new(1, 16);
pub const ORIGIN: AxisPosition = AxisPosition::new(412.5, 1033.0);

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StopSpindle,
    Write(IoPoint, bool),
    Motion(MotionCommand),
    Wait(Duration),
    HaltDecel,
    HardStop,
    Commit(ToolNumber),
    Notify(String),
    Confirm(String, OperatorResponse),
}

type Journal = Rc<RefCell<Vec<Event>>>;
type Trigger = Box<dyn Fn(&Event) -> bool>;

// ─── Machine ────────────────────────────────────────────────────────

pub struct RecordingMachine {
    journal: Journal,
    inputs: HashMap<IoPoint, bool>,
    pinned: HashSet<IoPoint>,
    pub homed: HomedAxes,
    pub position: AxisPosition,
    pub current: ToolNumber,
    pub requested: ToolNumber,
    pub spindle: bool,
    pub stuck_moving: bool,
    pub fail_commit: bool,
    interrupted: bool,
    interrupt_when: Option<Trigger>,
}

impl RecordingMachine {
    fn record(&mut self, event: Event) {
        self.journal.borrow_mut().push(event);
    }
}

impl MachineControl for RecordingMachine {
    fn homed_axes(&self) -> HomedAxes {
        self.homed
    }
    fn machine_position(&self) -> AxisPosition {
        self.position
    }
    fn current_tool(&self) -> ToolNumber {
        self.current
    }
    fn requested_tool(&self) -> ToolNumber {
        self.requested
    }
    fn spindle_running(&self) -> bool {
        self.spindle
    }
    fn stop_spindle(&mut self) {
        self.spindle = false;
        self.record(Event::StopSpindle);
    }
    fn read_input(&self, point: IoPoint) -> bool {
        self.inputs.get(&point).copied().unwrap_or(false)
    }
    fn write_output(&mut self, point: IoPoint, value: bool) {
        if !self.pinned.contains(&point) {
            self.inputs.insert(point, value);
        }
        self.record(Event::Write(point, value));
    }
    fn issue_motion(&mut self, command: &MotionCommand) {
        if let MotionCommand::Rapid {
            x: Some(x),
            y: Some(y),
            ..
        } = *command
        {
            self.position = AxisPosition::new(x, y);
        }
        self.record(Event::Motion(*command));
    }
    fn is_moving(&self) -> bool {
        self.stuck_moving
    }
    fn wait(&mut self, duration: Duration) {
        self.record(Event::Wait(duration));
    }
    fn cycle_interrupted(&self) -> bool {
        // Console events land in the same journal, so a dialog can trigger too.
        self.interrupted
            || self
                .interrupt_when
                .as_ref()
                .is_some_and(|trigger| self.journal.borrow().iter().any(|e| trigger(e)))
    }
    fn halt_with_deceleration(&mut self) {
        self.record(Event::HaltDecel);
    }
    fn hard_stop(&mut self) {
        self.record(Event::HardStop);
    }
    fn commit_current_tool(&mut self, tool: ToolNumber) -> Result<(), MachineError> {
        if self.fail_commit {
            return Err(MachineError::PersistenceError("read-only storage".to_string()));
        }
        self.current = tool;
        self.record(Event::Commit(tool));
        Ok(())
    }
}

// ─── Console ────────────────────────────────────────────────────────

pub struct RecordingConsole {
    journal: Journal,
    answers: VecDeque<OperatorResponse>,
}

impl OperatorConsole for RecordingConsole {
    fn notify(&mut self, message: &str) {
        self.journal.borrow_mut().push(Event::Notify(message.to_string()));
    }
    fn confirm(&mut self, message: &str) -> OperatorResponse {
        let response = self.answers.pop_front().unwrap_or(OperatorResponse::Proceed);
        self.journal
            .borrow_mut()
            .push(Event::Confirm(message.to_string(), response));
        response
    }
}

// ─── Bench ──────────────────────────────────────────────────────────

pub struct Bench {
    pub loaded: LoadedConfig,
    pub machine: RecordingMachine,
    pub console: RecordingConsole,
    journal: Journal,
}

impl Bench {
    pub fn new(current: i32, requested: i32) -> Self {
        Self::with_config(current, requested, "")
    }

    pub fn with_config(current: i32, requested: i32, toml: &str) -> Self {
        let journal: Journal = Rc::new(RefCell::new(Vec::new()));
        Self {
            loaded: load_config_from_str(toml).unwrap(),
            machine: RecordingMachine {
                journal: Rc::clone(&journal),
                inputs: HashMap::new(),
                pinned: HashSet::new(),
                homed: HomedAxes::all(),
                position: ORIGIN,
                current: ToolNumber::new(current),
                requested: ToolNumber::new(requested),
                spindle: false,
                stuck_moving: false,
                fail_commit: false,
                interrupted: false,
                interrupt_when: None,
            },
            console: RecordingConsole {
                journal: Rc::clone(&journal),
                answers: VecDeque::new(),
            },
            journal,
        }
    }

    /// Operator answers in order; `Proceed` once exhausted.
    pub fn answers(mut self, answers: &[OperatorResponse]) -> Self {
        self.console.answers = answers.iter().copied().collect();
        self
    }

    /// Pin a sensor to a state regardless of its output.
    pub fn pin_sensor(mut self, point: IoPoint, state: bool) -> Self {
        self.machine.inputs.insert(point, state);
        self.machine.pinned.insert(point);
        self
    }

    /// Sensor starts in a state but follows its output afterwards.
    pub fn sensor(mut self, point: IoPoint, state: bool) -> Self {
        self.machine.inputs.insert(point, state);
        self
    }

    /// Raise the stop signal from the first journal event matching `trigger` on,
    /// machine and console events alike.
    pub fn interrupt_when(mut self, trigger: impl Fn(&Event) -> bool + 'static) -> Self {
        self.machine.interrupt_when = Some(Box::new(trigger));
        self
    }

    pub fn interrupted_from_start(mut self) -> Self {
        self.machine.interrupted = true;
        self
    }

    pub fn run(&mut self) -> Result<CycleReport, SequenceError> {
        let sequencer = Sequencer::new(&self.loaded.config, &self.loaded.slot_map);
        sequencer.run(&mut self.machine, &mut self.console)
    }

    pub fn events(&self) -> Vec<Event> {
        self.journal.borrow().clone()
    }

    pub fn motions(&self) -> Vec<MotionCommand> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Motion(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn commits(&self) -> Vec<ToolNumber> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Commit(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Confirm(text, _) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Index of the first event matching `pred`.
    pub fn position_of(&self, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events().iter().position(|e| pred(e))
    }

    /// Index of the first event at or after `from` matching `pred`.
    pub fn position_after(&self, from: usize, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events()
            .iter()
            .skip(from)
            .position(|e| pred(e))
            .map(|i| i + from)
    }

    /// True if no actuator or motion command was issued.
    pub fn hardware_untouched(&self) -> bool {
        !self.events().iter().any(|e| {
            matches!(
                e,
                Event::Write(..) | Event::Motion(_) | Event::StopSpindle | Event::Commit(_)
            )
        })
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

pub fn slot_xy(tool: i32) -> (f64, f64) {
    (23.925 + (tool - 1) as f64 * 130.0, 2409.3)
}

pub fn is_rapid_xy(event: &Event, x: f64, y: f64) -> bool {
    matches!(
        event,
        Event::Motion(MotionCommand::Rapid { x: Some(ex), y: Some(ey), z: None })
            if (*ex - x).abs() < 1e-9 && (*ey - y).abs() < 1e-9
    )
}

pub fn is_z_move_to(event: &Event, z: f64) -> bool {
    match event {
        Event::Motion(m) => m.target_z().is_some_and(|t| (t - z).abs() < 1e-9),
        _ => false,
    }
}

pub fn is_write(event: &Event, point: IoPoint, value: bool) -> bool {
    *event == Event::Write(point, value)
}
