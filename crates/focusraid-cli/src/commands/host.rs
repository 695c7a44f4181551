//! Shared plumbing: load the engine, run one operation, persist it again.

use chrono::{DateTime, Utc};
use focusraid_core::{
    BattleEngine, BattleSnapshot, Clock, Config, CoreError, Database, EngineEvent, EngineState,
    ExitOption, ExitPolicy, FreezeRecord, LiveBattle, SystemClock,
};
use serde::Serialize;
use tracing::debug;

pub const SNAPSHOT_KEY: &str = "battle_snapshot";
pub const LAST_SEEN_KEY: &str = "last_seen_at";
pub const GROUP_KEY: &str = "focus_group";

/// Read-only view of the engine printed after every command.
#[derive(Debug, Serialize)]
pub struct StatusView {
    pub state: EngineState,
    pub task: Option<String>,
    pub max_hp: Option<f64>,
    pub current_hp: Option<f64>,
    pub elapsed: Option<f64>,
    pub wasted_time: f64,
    pub is_immune: bool,
    pub immunity_count: u32,
    pub freeze_tokens_remaining: u32,
    pub freeze_history: Vec<FreezeRecord>,
    pub focused_today: f64,
    pub rest_remaining: Option<f64>,
    pub exit_option: Option<ExitOption>,
}

#[derive(Debug, Serialize)]
pub struct Outcome {
    pub applied: bool,
    pub status: StatusView,
    pub events: Vec<EngineEvent>,
}

pub struct Host {
    pub db: Database,
    pub config: Config,
    pub live: LiveBattle<SystemClock>,
}

impl Host {
    /// Open storage, restore the last snapshot and bring it up to now.
    pub fn open() -> Result<Self, CoreError> {
        let mut host = Self::restore()?;
        host.live.tick();
        Ok(host)
    }

    /// Open storage and restore the last snapshot without ticking. Crash
    /// recovery must reconcile before the first tick, or the gap would be
    /// counted as focus.
    pub fn restore() -> Result<Self, CoreError> {
        let config = Config::load()?;
        let db = Database::open()?;
        let mut engine = BattleEngine::new(config.battle.clone());
        if let Some(snapshot) = db.kv_get_json::<BattleSnapshot>(SNAPSHOT_KEY)? {
            engine.restore(&snapshot);
        }
        let live = LiveBattle::new(engine, SystemClock);
        Ok(Self { db, config, live })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.live.clock().now()
    }

    pub fn last_seen(&self) -> Result<Option<DateTime<Utc>>, CoreError> {
        self.db.kv_get_json(LAST_SEEN_KEY)
    }

    pub fn status(&self) -> StatusView {
        let engine = self.live.engine();
        let now = self.now();
        let elapsed = engine.current_session_elapsed(now);
        StatusView {
            state: engine.state(),
            task: engine.boss().map(|b| b.name.clone()),
            max_hp: engine.boss().map(|b| b.max_hp),
            current_hp: engine.current_hp(),
            elapsed,
            wasted_time: engine.wasted_time(),
            is_immune: engine.is_immune(),
            immunity_count: engine.immunity_count(),
            freeze_tokens_remaining: engine.freeze_tokens_remaining(),
            freeze_history: engine.freeze_history().to_vec(),
            focused_today: engine.focused_today(now),
            rest_remaining: engine.rest_remaining(now),
            exit_option: ExitPolicy::from(engine.config()).option_for(elapsed),
        }
    }

    /// Tick, log results, save the snapshot and stamp `last_seen_at`.
    pub fn commit(mut self, applied: bool) -> Result<Outcome, CoreError> {
        self.live.tick();
        let events = self.live.engine_mut().drain_events();
        for result in events.iter().filter_map(EngineEvent::session_result) {
            if !self.db.record_result(result)? {
                debug!(task = %result.task_name, "result already recorded");
            }
        }
        let now = self.now();
        self.db
            .kv_set_json(SNAPSHOT_KEY, &self.live.engine().snapshot())?;
        self.db.kv_set_json(LAST_SEEN_KEY, &now)?;
        Ok(Outcome {
            applied,
            status: self.status(),
            events,
        })
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
