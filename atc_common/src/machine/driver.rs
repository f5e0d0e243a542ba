//! Machine-control traits and error types.
//!
//! This module defines:
//! - `MachineControl` trait - Capability set of the host controller
//! - `OperatorConsole` trait - Operator notification and confirmation
//! - `MachineError` enum - Failures reported by a host implementation

use crate::io::{HomedAxes, IoPoint};
use crate::machine::types::{AxisPosition, MotionCommand, OperatorResponse};
use crate::tool::ToolNumber;
use std::time::Duration;
use thiserror::Error;

/// Error types for machine-control operations.
#[derive(Debug, Clone, Error)]
pub enum MachineError {
    /// Host or driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Host communication error
    #[error("Host communication error: {0}")]
    CommunicationError(String),

    /// Persisting the current tool failed
    #[error("State persistence error: {0}")]
    PersistenceError(String),
}

/// Capability set of the host machine controller.
///
/// The tool-change sequencer issues exactly one command at a time through
/// this trait. `wait` and polling `is_moving` are the only points where the
/// caller blocks.
///
/// # Contract
///
/// | Operation               | Blocking | Notes                                   |
/// |-------------------------|----------|-----------------------------------------|
/// | `issue_motion()`        | No       | Queues the move; poll `is_moving()`     |
/// | `wait()`                | Yes      | Fixed dwell, never shortened            |
/// | `read_input()`          | No       | Physical feedback, independent of DO    |
/// | `commit_current_tool()` | No       | Persists the tool-in-spindle value      |
pub trait MachineControl {
    /// Homing state of X, Y and Z.
    fn homed_axes(&self) -> HomedAxes;

    /// Current machine absolute XY position.
    fn machine_position(&self) -> AxisPosition;

    /// Persisted tool-in-spindle value.
    fn current_tool(&self) -> ToolNumber;

    /// Tool requested by the running program.
    fn requested_tool(&self) -> ToolNumber;

    /// True if the spindle turns in either direction.
    fn spindle_running(&self) -> bool;

    /// Stop the spindle (M5). Spin-down continues after return.
    fn stop_spindle(&mut self);

    /// Read a digital input.
    fn read_input(&self, point: IoPoint) -> bool;

    /// Write a digital output.
    fn write_output(&mut self, point: IoPoint, value: bool);

    /// Hand a motion command to the motion executor.
    fn issue_motion(&mut self, command: &MotionCommand);

    /// True while any axis is still in motion.
    fn is_moving(&self) -> bool;

    /// Block for a fixed duration.
    fn wait(&mut self, duration: Duration);

    /// True once the operator pressed stop during this cycle.
    fn cycle_interrupted(&self) -> bool;

    /// Stop program execution with a controlled deceleration.
    fn halt_with_deceleration(&mut self);

    /// Stop program execution immediately.
    fn hard_stop(&mut self);

    /// Persist the tool-in-spindle value.
    ///
    /// # Errors
    /// Return `MachineError::PersistenceError` if the value cannot be stored.
    fn commit_current_tool(&mut self, tool: ToolNumber) -> Result<(), MachineError>;
}

/// Operator dialog surface.
///
/// `notify` is fire-and-forget; `confirm` blocks until the operator answers.
pub trait OperatorConsole {
    /// Show a message without waiting for an answer.
    fn notify(&mut self, message: &str);

    /// Show a message and block until the operator proceeds or cancels.
    fn confirm(&mut self, message: &str) -> OperatorResponse;
}
