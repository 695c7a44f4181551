mod boss;
mod engine;
mod result;
mod snapshot;

pub use boss::{Boss, BossStyle, EngineState, TaskTemplate};
pub use engine::{BattleEngine, EngineConfig};
pub use result::{EndReason, FreezeRecord, SessionResult};
pub use snapshot::BattleSnapshot;
