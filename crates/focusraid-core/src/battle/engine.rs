//! Battle engine implementation.
//!
//! The battle engine is a wall-clock-based state machine. It never reads the
//! system clock: every mutating call takes the current time as `at`, so any
//! sequence of calls can be replayed with synthetic timestamps. The caller is
//! responsible for calling `tick()` periodically (about once a second).
//!
//! ## State Transitions
//!
//! ```text
//! Idle ──start_battle──> Fighting <──pause/resume──> Paused
//!                           │  ^
//!              freeze(token)│  │resume_from_freeze
//!                           v  │
//!                          Frozen
//!
//! {Fighting, Paused, Frozen} ──tick(elapsed >= max_hp) | force_complete──> Victory
//! {Fighting, Paused, Frozen} ──retreat──> Retreat
//! {Fighting, Paused, Frozen} ──abort_session──> Idle
//! Idle ──start_rest──> Resting ──tick(elapsed >= duration)──> Idle
//! ```
//!
//! ## Time accounting
//!
//! Active elapsed seconds are `prior_active + (at - segment_start)` while
//! fighting and `prior_active` otherwise. Pausing or freezing commits the
//! in-flight segment; resuming opens a new one.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::boss::{Boss, EngineState};
use super::result::{EndReason, FreezeRecord, SessionResult};
use super::snapshot::BattleSnapshot;
use crate::clock::seconds_between;
use crate::events::{EngineEvent, EventQueue};

/// Tunables for the battle engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Backgrounding up to this many seconds is forgiven entirely.
    #[serde(default = "default_grace_window_secs")]
    pub grace_window_secs: f64,
    /// Freeze tokens handed out at the start of each battle.
    #[serde(default = "default_freeze_tokens")]
    pub freeze_tokens_per_battle: u32,
    /// How long after starting the host may offer "undo start".
    #[serde(default = "default_undo_start_window_secs")]
    pub undo_start_window_secs: f64,
}

fn default_grace_window_secs() -> f64 {
    10.0
}
fn default_freeze_tokens() -> u32 {
    3
}
fn default_undo_start_window_secs() -> f64 {
    60.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grace_window_secs: default_grace_window_secs(),
            freeze_tokens_per_battle: default_freeze_tokens(),
            undo_start_window_secs: default_undo_start_window_secs(),
        }
    }
}

/// Core battle engine.
///
/// Single writer, not reentrant: wrap it in a mutex or actor if more than one
/// caller needs it.
#[derive(Debug, Clone, Default)]
pub struct BattleEngine {
    config: EngineConfig,
    state: EngineState,
    boss: Option<Boss>,
    /// Active seconds committed before the in-flight segment.
    prior_active: f64,
    /// Start of the in-flight segment. `Some` only while fighting.
    segment_start: Option<DateTime<Utc>>,
    wasted_time: f64,
    is_immune: bool,
    immunity_count: u32,
    distraction_start: Option<DateTime<Utc>>,
    /// Token pool fixed when the battle started. `None` outside a battle.
    freeze_token_pool: Option<u32>,
    freeze_tokens_used: u32,
    freeze_started_at: Option<DateTime<Utc>>,
    freeze_history: Vec<FreezeRecord>,
    focused_today: f64,
    focus_day: Option<NaiveDate>,
    rest_started_at: Option<DateTime<Utc>>,
    rest_duration: f64,
    events: EventQueue,
}

impl BattleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn boss(&self) -> Option<&Boss> {
        self.boss.as_ref()
    }

    /// HP as of the last tick or transition. `None` when no boss is up.
    pub fn current_hp(&self) -> Option<f64> {
        self.boss.as_ref().map(|b| b.current_hp)
    }

    pub fn wasted_time(&self) -> f64 {
        self.wasted_time
    }

    pub fn is_immune(&self) -> bool {
        self.is_immune
    }

    pub fn immunity_count(&self) -> u32 {
        self.immunity_count
    }

    pub fn distraction_start(&self) -> Option<DateTime<Utc>> {
        self.distraction_start
    }

    pub fn freeze_tokens_used(&self) -> u32 {
        self.freeze_tokens_used
    }

    /// Tokens granted to the current battle. Config edits made mid-battle
    /// only apply to the next one.
    pub fn freeze_token_pool(&self) -> u32 {
        self.freeze_token_pool
            .unwrap_or(self.config.freeze_tokens_per_battle)
    }

    pub fn freeze_tokens_remaining(&self) -> u32 {
        self.freeze_token_pool()
            .saturating_sub(self.freeze_tokens_used)
    }

    pub fn freeze_history(&self) -> &[FreezeRecord] {
        &self.freeze_history
    }

    /// Seconds credited on the calendar day (UTC) of `at`.
    pub fn focused_today(&self, at: DateTime<Utc>) -> f64 {
        if self.focus_day == Some(at.date_naive()) {
            self.focused_today
        } else {
            0.0
        }
    }

    /// Active focus seconds of the current battle at `at`.
    pub fn elapsed(&self, at: DateTime<Utc>) -> f64 {
        match self.segment_start {
            Some(start) => self.prior_active + seconds_between(start, at),
            None => self.prior_active,
        }
    }

    /// Elapsed seconds of the battle in progress, for exit-confirmation
    /// policies. `None` unless fighting, paused or frozen.
    pub fn current_session_elapsed(&self, at: DateTime<Utc>) -> Option<f64> {
        self.state.in_battle().then(|| self.elapsed(at))
    }

    /// Seconds left on the rest countdown, if resting.
    pub fn rest_remaining(&self, at: DateTime<Utc>) -> Option<f64> {
        if self.state != EngineState::Resting {
            return None;
        }
        let started = self.rest_started_at?;
        Some((self.rest_duration - seconds_between(started, at)).max(0.0))
    }

    /// Take every event produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain()
    }

    // ── Session starts ───────────────────────────────────────────────

    /// Put `boss` on the field at full HP. Always succeeds; a session in
    /// flight is discarded without credit or result.
    pub fn start_battle(&mut self, mut boss: Boss, at: DateTime<Utc>) {
        self.discard_in_flight("start_battle");
        self.reset_session();
        boss.current_hp = boss.max_hp;
        info!(task = %boss.name, max_hp = boss.max_hp, "battle started");
        self.boss = Some(boss);
        self.freeze_token_pool = Some(self.config.freeze_tokens_per_battle);
        self.segment_start = Some(at);
        self.state = EngineState::Fighting;
    }

    /// Begin a rest countdown of `duration` seconds. Always succeeds.
    pub fn start_rest(&mut self, duration: f64, at: DateTime<Utc>) {
        self.discard_in_flight("start_rest");
        self.reset_session();
        self.rest_started_at = Some(at);
        self.rest_duration = duration.max(0.0);
        self.state = EngineState::Resting;
        info!(duration = self.rest_duration, "rest started");
    }

    // ── Clock ────────────────────────────────────────────────────────

    /// Refresh derived HP and fire time-based transitions.
    pub fn tick(&mut self, at: DateTime<Utc>) {
        match self.state {
            EngineState::Fighting | EngineState::Paused | EngineState::Frozen => {
                let elapsed = self.elapsed(at);
                let Some(boss) = self.boss.as_mut() else {
                    return;
                };
                boss.apply_elapsed(elapsed);
                if elapsed >= boss.max_hp {
                    let max_hp = boss.max_hp;
                    self.finish(EndReason::Victory, max_hp, None, at);
                }
            }
            EngineState::Resting => {
                let Some(started) = self.rest_started_at else {
                    return;
                };
                if seconds_between(started, at) >= self.rest_duration {
                    let duration_secs = self.rest_duration;
                    self.rest_started_at = None;
                    self.rest_duration = 0.0;
                    self.state = EngineState::Idle;
                    info!(duration = duration_secs, "rest complete");
                    self.events
                        .push(EngineEvent::BonfireComplete { duration_secs, at });
                }
            }
            EngineState::Idle | EngineState::Victory | EngineState::Retreat => {}
        }
    }

    // ── Interruptions ────────────────────────────────────────────────

    /// Pause a running battle. Free and unlimited.
    pub fn pause(&mut self, at: DateTime<Utc>) -> bool {
        if self.state != EngineState::Fighting {
            return false;
        }
        self.commit_segment(at);
        self.state = EngineState::Paused;
        debug!(elapsed = self.prior_active, "paused");
        true
    }

    pub fn resume(&mut self, at: DateTime<Utc>) -> bool {
        if self.state != EngineState::Paused {
            return false;
        }
        self.segment_start = Some(at);
        self.state = EngineState::Fighting;
        debug!(elapsed = self.prior_active, "resumed");
        true
    }

    /// Spend a freeze token. Returns `false` and changes nothing unless
    /// fighting with at least one token left.
    pub fn freeze(&mut self, at: DateTime<Utc>) -> bool {
        if self.state != EngineState::Fighting || self.freeze_tokens_remaining() == 0 {
            return false;
        }
        self.commit_segment(at);
        self.freeze_tokens_used += 1;
        self.freeze_started_at = Some(at);
        self.state = EngineState::Frozen;
        debug!(
            tokens_left = self.freeze_tokens_remaining(),
            elapsed = self.prior_active,
            "frozen"
        );
        true
    }

    pub fn resume_from_freeze(&mut self, at: DateTime<Utc>) -> bool {
        if self.state != EngineState::Frozen {
            return false;
        }
        let duration = self
            .freeze_started_at
            .take()
            .map(|started| seconds_between(started, at))
            .unwrap_or(0.0);
        let task_name = self
            .boss
            .as_ref()
            .map(|b| b.name.clone())
            .unwrap_or_default();
        self.freeze_history.push(FreezeRecord {
            task_name,
            duration,
        });
        self.segment_start = Some(at);
        self.state = EngineState::Fighting;
        debug!(frozen_for = duration, "thawed");
        true
    }

    // ── Exits ────────────────────────────────────────────────────────

    /// Stop early, keeping credit for the time actually focused.
    pub fn retreat(&mut self, at: DateTime<Utc>) -> bool {
        if !self.state.in_battle() {
            return false;
        }
        let Some(max_hp) = self.boss.as_ref().map(|b| b.max_hp) else {
            return false;
        };
        let focused = self.elapsed(at).min(max_hp);
        self.finish(
            EndReason::IncompleteExit,
            focused,
            Some(max_hp - focused),
            at,
        );
        true
    }

    /// Skip straight to victory with full credit, ignoring the clock.
    pub fn force_complete_task(&mut self, at: DateTime<Utc>) -> bool {
        if !self.state.in_battle() {
            return false;
        }
        let Some(max_hp) = self.boss.as_ref().map(|b| b.max_hp) else {
            return false;
        };
        self.finish(EndReason::ForcedComplete, max_hp, None, at);
        true
    }

    /// Throw the attempt away: back to idle, nothing credited or published.
    pub fn abort_session(&mut self) {
        let task = self.boss.as_ref().map(|b| b.name.clone());
        self.close_immunity();
        self.reset_session();
        self.state = EngineState::Idle;
        info!(task = ?task, "session aborted");
    }

    // ── Lifecycle hooks ──────────────────────────────────────────────

    pub fn grant_immunity(&mut self) {
        self.is_immune = true;
    }

    /// The app went to the background.
    pub fn handle_backgrounding(&mut self, at: DateTime<Utc>) {
        if self.state == EngineState::Fighting && self.distraction_start.is_none() {
            self.distraction_start = Some(at);
            debug!("distraction started");
        }
    }

    /// The app came back. Away time beyond the grace window is charged in
    /// full; returns the seconds added to wasted time.
    pub fn handle_foregrounding(&mut self, at: DateTime<Utc>) -> f64 {
        let Some(started) = self.distraction_start.take() else {
            return 0.0;
        };
        if !self.state.in_battle() || self.is_immune {
            return 0.0;
        }
        let away = seconds_between(started, at);
        if away <= self.config.grace_window_secs {
            debug!(away, "distraction forgiven");
            return 0.0;
        }
        self.wasted_time += away;
        info!(away, wasted = self.wasted_time, "distraction charged");
        away
    }

    /// Crash recovery, called once right after `restore`. The gap between
    /// `last_seen_at` and `now` is charged as wasted time (unless immune)
    /// but never counts as focus. Returns the seconds charged.
    pub fn reconcile(&mut self, last_seen_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        if !self.state.in_battle() {
            return 0.0;
        }
        let gap = seconds_between(last_seen_at, now);
        if let Some(start) = self.segment_start {
            self.prior_active += seconds_between(start, last_seen_at);
            self.segment_start = Some(now);
        }
        // The gap already covers any distraction in flight at death.
        self.distraction_start = None;
        if self.is_immune {
            info!(gap, "reconciled under immunity");
            return 0.0;
        }
        self.wasted_time += gap;
        info!(gap, wasted = self.wasted_time, "reconciled");
        gap
    }

    // ── Persistence ──────────────────────────────────────────────────

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            task: self.boss.clone(),
            state: self.state,
            start_time: self.segment_start,
            elapsed_before_last_save: self.prior_active,
            wasted_time: self.wasted_time,
            is_immune: self.is_immune,
            immunity_count: self.immunity_count,
            distraction_start_time: self.distraction_start,
            total_focused_history_today: self.focused_today,
            history: self.freeze_history.clone(),
            focus_day: self.focus_day,
            freeze_token_pool: self.freeze_token_pool,
            freeze_tokens_used: self.freeze_tokens_used,
            freeze_started_at: self.freeze_started_at,
            rest_started_at: self.rest_started_at,
            rest_duration: self.rest_duration,
        }
    }

    /// Copy every field of `snapshot` verbatim. Does not look at the clock.
    pub fn restore(&mut self, snapshot: &BattleSnapshot) {
        self.boss = snapshot.task.clone();
        self.state = snapshot.state;
        self.segment_start = snapshot.start_time;
        self.prior_active = snapshot.elapsed_before_last_save;
        self.wasted_time = snapshot.wasted_time;
        self.is_immune = snapshot.is_immune;
        self.immunity_count = snapshot.immunity_count;
        self.distraction_start = snapshot.distraction_start_time;
        self.focused_today = snapshot.total_focused_history_today;
        self.freeze_history = snapshot.history.clone();
        self.focus_day = snapshot.focus_day;
        self.freeze_token_pool = snapshot.freeze_token_pool;
        self.freeze_tokens_used = snapshot.freeze_tokens_used;
        self.freeze_started_at = snapshot.freeze_started_at;
        self.rest_started_at = snapshot.rest_started_at;
        self.rest_duration = snapshot.rest_duration;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn commit_segment(&mut self, at: DateTime<Utc>) {
        if let Some(start) = self.segment_start.take() {
            self.prior_active += seconds_between(start, at);
        }
        let elapsed = self.prior_active;
        if let Some(boss) = self.boss.as_mut() {
            boss.apply_elapsed(elapsed);
        }
    }

    fn finish(
        &mut self,
        reason: EndReason,
        focused_seconds: f64,
        remaining_seconds_at_exit: Option<f64>,
        at: DateTime<Utc>,
    ) {
        let Some(boss) = self.boss.take() else {
            return;
        };
        self.credit_focus(focused_seconds, at);
        self.close_immunity();
        self.segment_start = None;
        self.distraction_start = None;
        self.freeze_started_at = None;
        self.state = match reason {
            EndReason::IncompleteExit => EngineState::Retreat,
            EndReason::Victory | EndReason::ForcedComplete => EngineState::Victory,
        };
        info!(
            task = %boss.name,
            reason = reason.as_str(),
            focused = focused_seconds,
            wasted = self.wasted_time,
            "battle ended"
        );
        self.events.push(EngineEvent::SessionCompleted {
            result: SessionResult {
                end_reason: reason,
                focused_seconds,
                wasted_seconds: self.wasted_time,
                remaining_seconds_at_exit,
                task_id: boss.id,
                task_name: boss.name,
                timestamp: at,
            },
        });
    }

    fn credit_focus(&mut self, seconds: f64, at: DateTime<Utc>) {
        let day = at.date_naive();
        if self.focus_day != Some(day) {
            self.focus_day = Some(day);
            self.focused_today = 0.0;
        }
        self.focused_today += seconds;
    }

    fn close_immunity(&mut self) {
        if self.is_immune {
            self.immunity_count += 1;
            self.is_immune = false;
        }
    }

    fn discard_in_flight(&mut self, by: &str) {
        if self.state.is_terminal() {
            return;
        }
        warn!(
            state = ?self.state,
            task = ?self.boss.as_ref().map(|b| b.name.as_str()),
            by,
            "discarding session in flight"
        );
        self.close_immunity();
    }

    /// Clear every per-session field; daily totals and the immunity
    /// counter survive.
    fn reset_session(&mut self) {
        self.boss = None;
        self.prior_active = 0.0;
        self.segment_start = None;
        self.wasted_time = 0.0;
        self.is_immune = false;
        self.distraction_start = None;
        self.freeze_token_pool = None;
        self.freeze_tokens_used = 0;
        self.freeze_started_at = None;
        self.freeze_history.clear();
        self.rest_started_at = None;
        self.rest_duration = 0.0;
    }
}
