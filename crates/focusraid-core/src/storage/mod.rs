mod config;
pub mod database;

pub use config::Config;
pub use database::{DailyStats, Database, StoredResult};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the FocusRaid data directory, creating it if needed.
///
/// `FOCUSRAID_HOME` wins when set. Otherwise `~/.config/focusraid[-dev]/`,
/// with the `-dev` suffix when `FOCUSRAID_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSRAID_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSRAID_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusraid-dev")
            } else {
                base_dir.join("focusraid")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDirUnavailable {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
