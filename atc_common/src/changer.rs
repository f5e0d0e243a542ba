//! Tool changer configuration.
//!
//! Static settings of the sliding-rack changer: rack geometry, Z heights,
//! park position, motion limits, fixed dwell times and actuator I/O.

pub mod config;
