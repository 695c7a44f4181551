//! # FocusRaid Core Library
//!
//! This library provides the focus session engine behind FocusRaid, a
//! productivity app that turns timed tasks into boss battles against the
//! clock. Hosts (the CLI, a GUI) drive it; it never reads the clock itself.
//!
//! ## Architecture
//!
//! - **Battle Engine**: A deterministic state machine that converts active
//!   focus time into damage, and accounts for pauses, token-limited freezes,
//!   backgrounding and process death without losing or double-counting time
//! - **Focus Groups**: A segment ledger that splits one focus block across
//!   several interchangeable tasks
//! - **Storage**: SQLite result log and kv store, TOML configuration
//!
//! ## Key Components
//!
//! - [`BattleEngine`]: Core battle state machine
//! - [`FocusGroupSessionCoordinator`]: Multi-task time allocation
//! - [`LiveBattle`]: Real-clock wrapper for hosts
//! - [`Database`]: Session result persistence
//! - [`Config`]: Application configuration management

pub mod battle;
pub mod clock;
pub mod collaborators;
pub mod error;
pub mod events;
pub mod exit_policy;
pub mod focus_group;
pub mod storage;

pub use battle::{
    BattleEngine, BattleSnapshot, Boss, BossStyle, EndReason, EngineConfig, EngineState,
    FreezeRecord, SessionResult, TaskTemplate,
};
pub use clock::{Clock, LiveBattle, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::{EngineEvent, EventQueue};
pub use exit_policy::{ExitOption, ExitPolicy};
pub use focus_group::{ExplorationSummary, FocusGroupSessionCoordinator, FocusSegment, TemplateId};
pub use storage::{Config, DailyStats, Database};
