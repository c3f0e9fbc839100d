use serde::{Deserialize, Serialize};

use crate::model::ids::{LevelId, ModuleId};
use crate::model::level::Level;

/// Persisted completion state for one profession.
///
/// Carries booleans only; content always comes from the fixture. Unknown
/// fields in stored JSON are ignored so older, fuller payloads still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub levels: Vec<LevelSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub id: LevelId,
    #[serde(default)]
    pub completed: bool,
    /// Absent in some stored payloads; the fixture value applies then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked: Option<bool>,
    #[serde(default)]
    pub modules: Vec<ModuleSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    pub id: ModuleId,
    #[serde(default)]
    pub completed: bool,
}

impl ProgressSnapshot {
    /// Project the learner state out of a level list.
    #[must_use]
    pub fn from_levels(levels: &[Level]) -> Self {
        Self {
            levels: levels.iter().map(LevelSnapshot::from_level).collect(),
        }
    }

    #[must_use]
    pub fn level(&self, id: LevelId) -> Option<&LevelSnapshot> {
        self.levels.iter().find(|l| l.id == id)
    }
}

impl LevelSnapshot {
    #[must_use]
    pub fn from_level(level: &Level) -> Self {
        Self {
            id: level.id(),
            completed: level.is_completed(),
            unlocked: Some(level.is_unlocked()),
            modules: level
                .modules()
                .iter()
                .map(|m| ModuleSnapshot {
                    id: m.id(),
                    completed: m.is_completed(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&ModuleSnapshot> {
        self.modules.iter().find(|m| m.id == id)
    }
}
