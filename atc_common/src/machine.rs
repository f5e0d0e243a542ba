//! Machine-control capability set.
//!
//! The sequencer never talks to hardware directly. It drives the host
//! controller through [`driver::MachineControl`] and the operator through
//! [`driver::OperatorConsole`]. Implementations live in `atc_hal`
//! (simulation) or in a host integration.

pub mod driver;
pub mod types;
