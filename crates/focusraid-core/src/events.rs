use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::SessionResult;

/// Outbound notifications from the battle engine.
/// The engine only appends; the host drains once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A battle terminated (victory, retreat, or forced completion).
    SessionCompleted { result: SessionResult },
    /// A rest countdown ran out and the engine went back to idle.
    BonfireComplete {
        duration_secs: f64,
        at: DateTime<Utc>,
    },
}

impl EngineEvent {
    pub fn session_result(&self) -> Option<&SessionResult> {
        match self {
            EngineEvent::SessionCompleted { result } => Some(result),
            EngineEvent::BonfireComplete { .. } => None,
        }
    }
}

/// FIFO of events waiting for the host.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    pending: VecDeque<EngineEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: EngineEvent) {
        self.pending.push_back(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
