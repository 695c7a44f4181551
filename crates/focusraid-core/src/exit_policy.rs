//! Exit-confirmation policy.
//!
//! Right after a battle starts the user may simply undo it; later on the
//! only way out that keeps credit is to retreat.

use serde::{Deserialize, Serialize};

use crate::battle::EngineConfig;

/// What the host offers when the user asks to leave a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitOption {
    /// Discard the attempt (`abort_session`).
    UndoStart,
    /// Stop and keep partial credit (`retreat`).
    Retreat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitPolicy {
    pub undo_start_window_secs: f64,
}

impl Default for ExitPolicy {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for ExitPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            undo_start_window_secs: config.undo_start_window_secs,
        }
    }
}

impl ExitPolicy {
    /// Map `current_session_elapsed` to the exit on offer.
    pub fn option_for(&self, session_elapsed: Option<f64>) -> Option<ExitOption> {
        let elapsed = session_elapsed?;
        if elapsed < self.undo_start_window_secs {
            Some(ExitOption::UndoStart)
        } else {
            Some(ExitOption::Retreat)
        }
    }
}
