use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// HP reached zero on the clock.
    Victory,
    /// The user retreated; partial focus is still credited.
    IncompleteExit,
    /// Skipped to victory without running the clock.
    ForcedComplete,
}

impl EndReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::Victory => "victory",
            EndReason::IncompleteExit => "incomplete_exit",
            EndReason::ForcedComplete => "forced_complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "victory" => Some(EndReason::Victory),
            "incomplete_exit" => Some(EndReason::IncompleteExit),
            "forced_complete" => Some(EndReason::ForcedComplete),
            _ => None,
        }
    }
}

/// One-shot record of a terminated battle. Emitted exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub end_reason: EndReason,
    pub focused_seconds: f64,
    pub wasted_seconds: f64,
    /// Only set for `IncompleteExit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seconds_at_exit: Option<f64>,
    pub task_id: String,
    pub task_name: String,
    pub timestamp: DateTime<Utc>,
}

/// A completed freeze -> resume cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeRecord {
    pub task_name: String,
    /// Seconds spent frozen.
    pub duration: f64,
}
