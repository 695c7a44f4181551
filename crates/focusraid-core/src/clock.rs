//! Clock sources and the real-clock convenience wrapper.
//!
//! The engine API always takes time explicitly. [`LiveBattle`] is the thin
//! call-site layer that fills in "now" from a [`Clock`].

use std::cell::Cell;

use chrono::{DateTime, Duration, Utc};

use crate::battle::{BattleEngine, Boss};

/// Non-negative seconds from `from` to `to`. Clock skew backwards counts as zero.
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / 1000.0).max(0.0)
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now.set(self.now.get() + Duration::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// A [`BattleEngine`] bound to a clock.
#[derive(Debug, Clone)]
pub struct LiveBattle<C: Clock> {
    engine: BattleEngine,
    clock: C,
}

impl<C: Clock> LiveBattle<C> {
    pub fn new(engine: BattleEngine, clock: C) -> Self {
        Self { engine, clock }
    }

    pub fn engine(&self) -> &BattleEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut BattleEngine {
        &mut self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn start_battle(&mut self, boss: Boss) {
        let now = self.clock.now();
        self.engine.start_battle(boss, now);
    }

    pub fn start_rest(&mut self, duration: f64) {
        let now = self.clock.now();
        self.engine.start_rest(duration, now);
    }

    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.engine.tick(now);
    }

    pub fn pause(&mut self) -> bool {
        let now = self.clock.now();
        self.engine.pause(now)
    }

    pub fn resume(&mut self) -> bool {
        let now = self.clock.now();
        self.engine.resume(now)
    }

    pub fn freeze(&mut self) -> bool {
        let now = self.clock.now();
        self.engine.freeze(now)
    }

    pub fn resume_from_freeze(&mut self) -> bool {
        let now = self.clock.now();
        self.engine.resume_from_freeze(now)
    }

    pub fn retreat(&mut self) -> bool {
        let now = self.clock.now();
        self.engine.retreat(now)
    }

    pub fn force_complete_task(&mut self) -> bool {
        let now = self.clock.now();
        self.engine.force_complete_task(now)
    }

    pub fn handle_backgrounding(&mut self) {
        let now = self.clock.now();
        self.engine.handle_backgrounding(now);
    }

    pub fn handle_foregrounding(&mut self) -> f64 {
        let now = self.clock.now();
        self.engine.handle_foregrounding(now)
    }

    /// `reconcile(last_seen_at, now)`.
    pub fn reconcile_since(&mut self, last_seen_at: DateTime<Utc>) -> f64 {
        let now = self.clock.now();
        self.engine.reconcile(last_seen_at, now)
    }

    pub fn current_session_elapsed(&self) -> Option<f64> {
        self.engine.current_session_elapsed(self.clock.now())
    }
}
