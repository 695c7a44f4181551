//! Interfaces for collaborators the host plugs in next to the engine.
//!
//! Reminder evaluation and repeat-rule spawning live outside this crate;
//! only their contracts and the spawn ledger key format are defined here.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::TaskTemplate;

/// A reminder that came due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderEvent {
    pub node_id: String,
    pub title: String,
    pub due_at: DateTime<Utc>,
}

/// Fires each reminder at most once; a fired reminder never repeats.
pub trait ReminderEvaluator {
    type Node;

    fn evaluate(&mut self, nodes: &[Self::Node], now: DateTime<Utc>) -> Vec<ReminderEvent>;
}

/// Output of one spawner pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnOutcome {
    pub spawned: Vec<TaskTemplate>,
    /// Keys to add to the ledger so the same day never spawns twice.
    pub new_ledger_keys: Vec<String>,
}

/// Spawns tasks from repeat rules, idempotent per template per day via the
/// ledger.
pub trait RepeatSpawner {
    fn spawn(
        &self,
        templates: &[TaskTemplate],
        date: NaiveDate,
        ledger: &HashSet<String>,
    ) -> SpawnOutcome;
}

/// `"{template_id}_{yyyy-MM-dd}"`
pub fn spawn_ledger_key(template_id: &str, date: NaiveDate) -> String {
    format!("{template_id}_{}", date.format("%Y-%m-%d"))
}
