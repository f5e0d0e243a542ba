//! # ATC Sequencer Library
//!
//! Automatic tool change cycle for a CNC machine with a sliding tool rack,
//! a pneumatic chuck and a spindle. Tools inside the rack capacity are
//! swapped automatically; tools beyond it are handed over by the operator
//! at a park position.
//!
//! ## Components
//!
//! 1. **SafetyGate**: refuses changes that must not start
//! 2. **ActuatorController**: chuck and rack outputs, settle dwells and
//!    pre-flight normalization
//! 3. **ToolSlotMap**: rack slot positions, derived once from config
//! 4. **Sequencer**: the phase state machine driving a full cycle
//! 5. **InterruptionMonitor**: latched stop signal and bounded settle
//!
//! The sequencer never touches hardware directly; everything goes through
//! [`atc_common::machine::driver::MachineControl`] and
//! [`atc_common::machine::driver::OperatorConsole`].

pub mod budget;
pub mod config;
pub mod error;
pub mod gate;
pub mod interlock;
pub mod monitor;
pub mod report;
pub mod sequencer;
pub mod slot_map;

pub use error::SequenceError;
pub use report::{CycleOutcome, CycleReport};
pub use sequencer::{Phase, Sequencer};
