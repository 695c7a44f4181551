use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// How a boss is defeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BossStyle {
    /// Timer-driven: HP drains with active focus time.
    #[default]
    Focus,
    /// One-tap: the host completes it with `force_complete_task`.
    Passive,
}

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Idle,
    Fighting,
    Paused,
    Frozen,
    Resting,
    Victory,
    Retreat,
}

impl EngineState {
    /// States in which a boss is on the field.
    pub fn in_battle(self) -> bool {
        matches!(
            self,
            EngineState::Fighting | EngineState::Paused | EngineState::Frozen
        )
    }

    /// States that only `start_battle` / `start_rest` leave.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EngineState::Idle | EngineState::Victory | EngineState::Retreat
        )
    }
}

/// A reusable task definition that bosses can be spawned from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: String,
    pub name: String,
    /// Target duration in seconds.
    pub duration_secs: f64,
    #[serde(default)]
    pub style: BossStyle,
}

/// The task being fought. Its HP is the remaining focus time in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    pub id: String,
    pub name: String,
    /// Target duration, seconds.
    pub max_hp: f64,
    /// `max(0, max_hp - active elapsed)`, refreshed by the engine.
    pub current_hp: f64,
    #[serde(default)]
    pub style: BossStyle,
}

impl Boss {
    /// Create a full-health boss.
    ///
    /// # Errors
    /// Returns an error if `max_hp` is not a finite, positive number of seconds.
    pub fn new(
        name: impl Into<String>,
        max_hp: f64,
        style: BossStyle,
    ) -> Result<Self, ValidationError> {
        if !max_hp.is_finite() || max_hp <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "max_hp".into(),
                message: format!("must be a positive number of seconds, got {max_hp}"),
            });
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            max_hp,
            current_hp: max_hp,
            style,
        })
    }

    /// Spawn a boss from a template, keeping the template id.
    ///
    /// # Errors
    /// Returns an error if the template duration is not positive.
    pub fn from_template(template: &TaskTemplate) -> Result<Self, ValidationError> {
        let mut boss = Self::new(template.name.clone(), template.duration_secs, template.style)?;
        boss.id = template.id.clone();
        Ok(boss)
    }

    /// 0.0 .. 1.0 damage dealt so far.
    pub fn progress(&self) -> f64 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        (1.0 - self.current_hp / self.max_hp).clamp(0.0, 1.0)
    }

    pub(crate) fn apply_elapsed(&mut self, elapsed: f64) {
        self.current_hp = (self.max_hp - elapsed).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_duration() {
        assert!(Boss::new("Nap", 0.0, BossStyle::Focus).is_err());
        assert!(Boss::new("Nap", -5.0, BossStyle::Focus).is_err());
        assert!(Boss::new("Nap", f64::NAN, BossStyle::Focus).is_err());
    }

    #[test]
    fn hp_never_goes_negative() {
        let mut boss = Boss::new("Essay", 60.0, BossStyle::Focus).unwrap();
        boss.apply_elapsed(75.0);
        assert_eq!(boss.current_hp, 0.0);
        assert_eq!(boss.progress(), 1.0);
    }

    #[test]
    fn template_id_is_kept() {
        let template = TaskTemplate {
            id: "tpl-read".into(),
            name: "Read".into(),
            duration_secs: 1500.0,
            style: BossStyle::Focus,
        };
        let boss = Boss::from_template(&template).unwrap();
        assert_eq!(boss.id, "tpl-read");
        assert_eq!(boss.current_hp, 1500.0);
    }

    #[test]
    fn battle_states() {
        assert!(EngineState::Frozen.in_battle());
        assert!(!EngineState::Resting.in_battle());
        assert!(EngineState::Retreat.is_terminal());
        assert!(!EngineState::Resting.is_terminal());
    }
}
