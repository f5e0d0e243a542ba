//! ATC Common Library
//!
//! Shared constants, tool numbering, configuration loading and the
//! machine-control capability traits used by every crate of the ATC
//! workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Compile-time limits and default paths
//! - [`config`] - Configuration loading traits and shared config types
//! - [`changer`] - Tool changer configuration (rack, heights, timing, I/O)
//! - [`tool`] - `ToolNumber` and its rack classification
//! - [`io`] - Digital I/O points and homing flags
//! - [`machine`] - Collaborator traits the sequencer drives (`MachineControl`, `OperatorConsole`)
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use atc_common::prelude::*;
//!
//! let tool = ToolNumber::new(3);
//! assert_eq!(tool.classify(10), ToolClass::RackResident(3));
//! ```

pub mod changer;
pub mod config;
pub mod consts;
pub mod io;
pub mod machine;
pub mod prelude;
pub mod tool;
