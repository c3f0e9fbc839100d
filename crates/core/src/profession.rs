use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized profession identifier (lowercase, whitespace runs joined by `-`).
///
/// Every storage namespace and fixture lookup goes through [`ProfessionKey::normalize`]
/// so readers and writers always agree on the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfessionKey(String);

impl ProfessionKey {
    /// Profession used when the learner has none or the fixture lacks theirs.
    pub const DEFAULT: &'static str = "electrician";

    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let key = raw
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-");
        if key.is_empty() {
            Self::default()
        } else {
            Self(key)
        }
    }

    /// Key for an optional free-text profession, defaulting when absent.
    #[must_use]
    pub fn from_profession(raw: Option<&str>) -> Self {
        raw.map_or_else(Self::default, Self::normalize)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human label, e.g. `ac-technician` -> `ac technician`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.0.replace('-', " ")
    }
}

impl Default for ProfessionKey {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for ProfessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
