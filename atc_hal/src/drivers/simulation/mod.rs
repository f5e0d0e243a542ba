//! Simulation driver module.
//!
//! Software stand-in for the host controller: a virtual clock, XYZ motion
//! with per-move durations, digital I/O with linked sensor reactions and
//! a persisted tool-in-spindle value.

mod axes;
mod config;
mod io;
mod machine;
mod state;

pub use axes::MotionSimulator;
pub use config::SimulationConfig;
pub use io::{IoSimulator, LinkedInput};
pub use machine::{HaltKind, SimulatedMachine};
pub use state::{PersistedState, StatePersistence};
