//! System-wide constants for the ATC workspace.
//!
//! Single source of truth for numeric limits and default paths.

use static_assertions::const_assert;

/// Number of slots the sliding rack provides. Fixed at compile time.
pub const MAX_RACK_SLOTS: usize = 10;

/// Default highest tool number accepted by the safety gate.
pub const DEFAULT_MAX_TOTAL_TOOL: i32 = 48;

/// Hard ceiling for `max_total_tool` in configuration.
pub const TOOL_NUMBER_CEILING: i32 = 999;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/atc/atc.toml";

/// Default state file name (persisted current tool).
pub const DEFAULT_STATE_FILE: &str = "atc_state";

// Slot indices are carried as `u8`.
const_assert!(MAX_RACK_SLOTS <= u8::MAX as usize);
const_assert!(MAX_RACK_SLOTS as i32 <= DEFAULT_MAX_TOTAL_TOOL);
const_assert!(DEFAULT_MAX_TOTAL_TOOL <= TOOL_NUMBER_CEILING);
