//! State persistence for the simulation driver.
//!
//! The tool-in-spindle value survives restarts like it does on a real host
//! controller. State is persisted with bincode.

use atc_common::machine::driver::MachineError;
use atc_common::tool::ToolNumber;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Persisted state of the simulated machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    /// Version of state format (for migration)
    pub version: u32,
    /// Tool recorded in the spindle
    pub current_tool: ToolNumber,
    /// Timestamp of last save (Unix epoch seconds)
    pub saved_at: u64,
}

impl PersistedState {
    /// Current state format version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a state recording `current_tool`.
    pub fn new(current_tool: ToolNumber) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            current_tool,
            saved_at: 0,
        }
    }
}

/// State persistence manager.
#[derive(Debug, Clone)]
pub struct StatePersistence {
    path: PathBuf,
}

impl StatePersistence {
    /// Create a new persistence manager.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save state to file.
    pub fn save(&self, state: &PersistedState) -> Result<(), MachineError> {
        debug!("Saving state to {:?}", self.path);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MachineError::PersistenceError(format!("Failed to create directory: {}", e))
            })?;
        }

        let mut state = state.clone();
        state.saved_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let file = File::create(&self.path).map_err(|e| {
            MachineError::PersistenceError(format!("Failed to create state file: {}", e))
        })?;

        bincode::serialize_into(BufWriter::new(file), &state).map_err(|e| {
            MachineError::PersistenceError(format!("Failed to serialize state: {}", e))
        })?;

        info!("Saved current tool {} to {:?}", state.current_tool, self.path);
        Ok(())
    }

    /// Load state from file. A missing file or an older format yields `None`.
    pub fn load(&self) -> Result<Option<PersistedState>, MachineError> {
        debug!("Loading state from {:?}", self.path);

        if !self.path.exists() {
            debug!("State file does not exist, starting fresh");
            return Ok(None);
        }

        let file = File::open(&self.path).map_err(|e| {
            MachineError::PersistenceError(format!("Failed to open state file: {}", e))
        })?;

        let state: PersistedState = bincode::deserialize_from(BufReader::new(file)).map_err(|e| {
            MachineError::PersistenceError(format!("Failed to deserialize state: {}", e))
        })?;

        if state.version != PersistedState::CURRENT_VERSION {
            warn!(
                "State file version {} differs from current {}, starting fresh",
                state.version,
                PersistedState::CURRENT_VERSION
            );
            return Ok(None);
        }

        info!(
            "Loaded current tool {} from {:?} (saved at {})",
            state.current_tool, self.path, state.saved_at
        );
        Ok(Some(state))
    }
}
