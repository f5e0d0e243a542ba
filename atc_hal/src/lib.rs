//! # ATC HAL Library
//!
//! Machine-control drivers for the ATC sequencer. Drivers implement
//! [`atc_common::machine::driver::MachineControl`]; operator consoles
//! implement [`atc_common::machine::driver::OperatorConsole`].
//!
//! # Module Structure
//!
//! - [`drivers`] - Driver implementations
//! - [`console`] - Non-interactive operator consoles
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    atc_hal (single crate)                │
//! │  ┌──────────────────┐     ┌───────────────────────────┐  │
//! │  │ SimulatedMachine │────►│ VirtualClock              │  │
//! │  │ (MachineControl) │     └───────────────────────────┘  │
//! │  │                  │────►│ MotionSimulator (X, Y, Z) │  │
//! │  │                  │     └───────────────────────────┘  │
//! │  │                  │────►│ IoSimulator (linked DI)   │  │
//! │  │                  │     └───────────────────────────┘  │
//! │  │                  │────►│ StatePersistence (bincode)│  │
//! │  └──────────────────┘     └───────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod console;
pub mod drivers;

pub use crate::console::{ConsoleEntry, ScriptedConsole};
pub use crate::drivers::simulation::{SimulatedMachine, SimulationConfig};
