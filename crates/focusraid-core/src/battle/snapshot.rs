use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::boss::{Boss, EngineState};
use super::result::FreezeRecord;

/// Everything needed to rebuild a [`BattleEngine`](super::BattleEngine)
/// exactly via `restore`. Wall-clock catch-up is `reconcile`'s job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub task: Option<Boss>,
    pub state: EngineState,
    /// Start of the in-flight active segment; `None` while paused or frozen.
    pub start_time: Option<DateTime<Utc>>,
    /// Active seconds committed before the in-flight segment.
    pub elapsed_before_last_save: f64,
    pub wasted_time: f64,
    pub is_immune: bool,
    pub immunity_count: u32,
    #[serde(default)]
    pub distraction_start_time: Option<DateTime<Utc>>,
    pub total_focused_history_today: f64,
    /// Freeze log of the current battle.
    #[serde(default)]
    pub history: Vec<FreezeRecord>,

    #[serde(default)]
    pub focus_day: Option<NaiveDate>,
    /// Token pool the battle started with.
    #[serde(default)]
    pub freeze_token_pool: Option<u32>,
    #[serde(default)]
    pub freeze_tokens_used: u32,
    #[serde(default)]
    pub freeze_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rest_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rest_duration: f64,
}
