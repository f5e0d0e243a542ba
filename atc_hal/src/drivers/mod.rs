//! Machine-control driver implementations.
//!
//! - [`simulation`] - Software simulation driver for development and testing

pub mod simulation;
