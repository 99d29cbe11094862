//! Persistence of the calibration record.
//!
//! The record is stored as a small JSON object under the user's configuration
//! directory so it survives restarts. A missing or unreadable file simply
//! means the user has to calibrate again.

use crate::{
    calibration::CalibrationRecord,
    constants::{CALIBRATION_FILE_NAME, CONFIG_DIR_NAME},
    error::{Error, Result},
};
use log::{debug, info};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// File-backed calibration storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationStore {
    path: PathBuf,
}

impl CalibrationStore {
    /// Store at an explicit path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$XDG_CONFIG_HOME/headmouse/calibration.json`, falling back
    /// to `$HOME/.config/headmouse/calibration.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither variable is set.
    pub fn default_location() -> Result<Self> {
        let config_root = env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))
            .ok_or_else(|| Error::Persistence("Neither XDG_CONFIG_HOME nor HOME is set".to_string()))?;

        Ok(Self::new(config_root.join(CONFIG_DIR_NAME).join(CALIBRATION_FILE_NAME)))
    }

    /// Location of the calibration file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved calibration.
    ///
    /// Returns `Ok(None)` when no calibration has been saved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the file exists but cannot be read,
    /// does not parse, or holds a record with no usable range.
    pub fn load(&self) -> Result<Option<CalibrationRecord>> {
        if !self.path.exists() {
            debug!("No calibration file at {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| Error::Persistence(format!("Failed to read {}: {e}", self.path.display())))?;

        let record: CalibrationRecord = serde_json::from_str(&content)
            .map_err(|e| Error::Persistence(format!("Failed to parse {}: {e}", self.path.display())))?;

        record
            .validate()
            .map_err(|e| Error::Persistence(format!("Rejected {}: {e}", self.path.display())))?;

        info!("Loaded calibration from {}", self.path.display());
        Ok(Some(record))
    }

    /// Save a calibration, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the file cannot be written.
    pub fn save(&self, record: &CalibrationRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Persistence(format!("Failed to create {}: {e}", parent.display())))?;
        }

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| Error::Persistence(format!("Failed to serialize calibration: {e}")))?;

        fs::write(&self.path, content)
            .map_err(|e| Error::Persistence(format!("Failed to write {}: {e}", self.path.display())))?;

        info!("Saved calibration to {}", self.path.display());
        Ok(())
    }
}
