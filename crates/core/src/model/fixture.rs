//! Serde shape of the static curriculum document.
//!
//! ```json
//! { "professions": { "electrician": [ { "id": 1, "name_bn": "...", "name_en": "...",
//!   "completed": false, "unlocked": true,
//!   "modules": [ { "id": 1, "title_bn": "...", "title_en": "...", "completed": false,
//!                  "lesson_bn": "...", "lesson_en": "...", "image": "/img/1.png" } ] } ] } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::{LevelId, ModuleId};
use crate::model::level::{Level, Module};
use crate::model::localized::LocalizedText;
use crate::profession::ProfessionKey;

/// Whole curriculum document, keyed by profession key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureDocument {
    #[serde(default)]
    pub professions: BTreeMap<String, Vec<FixtureLevel>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureLevel {
    pub id: LevelId,
    #[serde(default)]
    pub name_bn: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub modules: Vec<FixtureModule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureModule {
    pub id: ModuleId,
    #[serde(default)]
    pub title_bn: String,
    #[serde(default)]
    pub title_en: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub lesson_bn: String,
    #[serde(default)]
    pub lesson_en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl FixtureDocument {
    /// Levels for `key`, or the default profession's levels when `key` is unknown.
    ///
    /// Returns an empty list when neither is present.
    #[must_use]
    pub fn levels_for(&self, key: &ProfessionKey) -> Vec<Level> {
        self.professions
            .get(key.as_str())
            .or_else(|| self.professions.get(ProfessionKey::DEFAULT))
            .map(|levels| levels.iter().map(FixtureLevel::to_level).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_profession(&self, key: &ProfessionKey) -> bool {
        self.professions.contains_key(key.as_str())
    }
}

impl FixtureLevel {
    #[must_use]
    pub fn to_level(&self) -> Level {
        Level::new(
            self.id,
            LocalizedText::new(&self.name_bn, &self.name_en),
            self.modules.iter().map(FixtureModule::to_module).collect(),
        )
        .with_flags(self.completed, self.unlocked)
    }
}

impl FixtureModule {
    #[must_use]
    pub fn to_module(&self) -> Module {
        Module::new(
            self.id,
            LocalizedText::new(&self.title_bn, &self.title_en),
            LocalizedText::new(&self.lesson_bn, &self.lesson_en),
            self.image.clone(),
        )
        .with_completed(self.completed)
    }
}
