use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profession::ProfessionKey;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("profile name cannot be empty")]
    EmptyName,

    #[error("profile phone cannot be empty")]
    EmptyPhone,
}

/// Unvalidated learner profile, in its stored JSON shape.
///
/// Fields owned by other parts of the product are kept in `extra` so a
/// read-modify-write here does not drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProfileDraft {
    /// Validate into a `UserProfile`.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if name or phone is blank.
    pub fn validate(self) -> Result<UserProfile, ProfileError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let phone = self.phone.trim().to_owned();
        if phone.is_empty() {
            return Err(ProfileError::EmptyPhone);
        }
        let trimmed = |v: Option<String>| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());

        Ok(UserProfile {
            name,
            phone,
            profession: trimmed(self.profession),
            district: trimmed(self.district),
            profile_image: trimmed(self.profile_image),
            last_updated: self.last_updated,
            extra: self.extra,
        })
    }
}

/// A learner's identity as stored on the device.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    name: String,
    phone: String,
    profession: Option<String>,
    district: Option<String>,
    profile_image: Option<String>,
    last_updated: Option<DateTime<Utc>>,
    extra: BTreeMap<String, serde_json::Value>,
}

impl UserProfile {
    // Accessors
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    #[must_use]
    pub fn profession(&self) -> Option<&str> {
        self.profession.as_deref()
    }

    #[must_use]
    pub fn district(&self) -> Option<&str> {
        self.district.as_deref()
    }

    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Uppercase first letter of the name, shown when there is no image.
    #[must_use]
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .map_or('U', |c| c.to_uppercase().next().unwrap_or(c))
    }

    #[must_use]
    pub fn profession_key(&self) -> ProfessionKey {
        ProfessionKey::from_profession(self.profession())
    }

    #[must_use]
    pub fn touched(mut self, at: DateTime<Utc>) -> Self {
        self.last_updated = Some(at);
        self
    }

    #[must_use]
    pub fn to_draft(&self) -> ProfileDraft {
        ProfileDraft {
            name: self.name.clone(),
            phone: self.phone.clone(),
            profession: self.profession.clone(),
            district: self.district.clone(),
            profile_image: self.profile_image.clone(),
            last_updated: self.last_updated,
            extra: self.extra.clone(),
        }
    }
}
