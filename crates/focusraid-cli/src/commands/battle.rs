use clap::Subcommand;
use focusraid_core::{Boss, BossStyle};
use tracing::info;

use super::host::{print_json, Host};

#[derive(Subcommand)]
pub enum BattleAction {
    /// Start a battle against a new boss
    Start {
        /// Task name
        name: String,
        /// Target duration in minutes (defaults to `defaults.battle_minutes`)
        #[arg(long)]
        minutes: Option<f64>,
        /// One-tap task, finished with `battle complete`
        #[arg(long)]
        passive: bool,
    },
    /// Pause the running battle
    Pause,
    /// Resume a paused battle
    Resume,
    /// Spend a freeze token
    Freeze,
    /// Resume from a freeze
    Thaw,
    /// Stop early and keep credit for focused time
    Retreat,
    /// Discard the current attempt
    Abort,
    /// Mark the boss defeated right away
    Complete,
    /// Stop charging distractions for this battle
    Immunity,
    /// Tell the engine the app went to the background
    Background,
    /// Tell the engine the app is back in the foreground
    Foreground,
}

pub fn run(action: BattleAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut host = Host::open()?;

    let applied = match action {
        BattleAction::Start {
            name,
            minutes,
            passive,
        } => {
            let minutes = minutes.unwrap_or(f64::from(host.config.defaults.battle_minutes));
            let style = if passive {
                BossStyle::Passive
            } else {
                BossStyle::Focus
            };
            let boss = Boss::new(name, minutes * 60.0, style)?;
            host.live.start_battle(boss);
            true
        }
        BattleAction::Pause => host.live.pause(),
        BattleAction::Resume => host.live.resume(),
        BattleAction::Freeze => host.live.freeze(),
        BattleAction::Thaw => host.live.resume_from_freeze(),
        BattleAction::Retreat => host.live.retreat(),
        BattleAction::Abort => {
            let was_active = !host.live.engine().state().is_terminal();
            host.live.engine_mut().abort_session();
            was_active
        }
        BattleAction::Complete => host.live.force_complete_task(),
        BattleAction::Immunity => {
            host.live.engine_mut().grant_immunity();
            true
        }
        BattleAction::Background => {
            host.live.handle_backgrounding();
            host.live.engine().distraction_start().is_some()
        }
        BattleAction::Foreground => host.live.handle_foregrounding() > 0.0,
    };

    print_json(&host.commit(applied)?)
}

pub fn status() -> Result<(), Box<dyn std::error::Error>> {
    let host = Host::open()?;
    print_json(&host.commit(true)?)
}

pub fn recover() -> Result<(), Box<dyn std::error::Error>> {
    let mut host = Host::restore()?;
    let charged = match host.last_seen()? {
        Some(last_seen) => host.live.reconcile_since(last_seen),
        None => 0.0,
    };
    info!(charged, "recovered");
    print_json(&host.commit(charged > 0.0)?)
}
