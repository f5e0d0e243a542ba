//! TOML configuration loader.
//!
//! Loads `AtcConfig`, validates it and derives the tool slot map once.
//! Nothing here is touched again while a cycle runs.

use std::path::Path;

use atc_common::changer::config::AtcConfig;
use atc_common::config::{ConfigError, ConfigLoader};
use tracing::{debug, info};

use crate::slot_map::ToolSlotMap;

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Validated configuration bundle, ready for runtime use.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AtcConfig,
    pub slot_map: ToolSlotMap,
}

impl LoadedConfig {
    /// Validate an in-memory config and derive its slot map.
    pub fn from_config(config: AtcConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let slot_map = ToolSlotMap::from_rack(&config.rack)?;
        for (tool, position) in slot_map.iter() {
            debug!(%tool, x = position.x, y = position.y, "Rack slot");
        }
        Ok(Self { config, slot_map })
    }
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the ATC configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let config = AtcConfig::load(path)?;
    let loaded = LoadedConfig::from_config(config)?;
    info!(
        path = %path.display(),
        slots = loaded.slot_map.slots(),
        max_total_tool = loaded.config.tools.max_total_tool,
        "ATC configuration loaded"
    );
    Ok(loaded)
}

/// Load and validate the ATC configuration from TOML text.
pub fn load_config_from_str(content: &str) -> Result<LoadedConfig, ConfigError> {
    LoadedConfig::from_config(AtcConfig::from_toml_str(content)?)
}
