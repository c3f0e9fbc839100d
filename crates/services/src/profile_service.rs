use sheba_core::model::{Language, ProfileDraft, UserProfile};
use sheba_core::{Clock, ProfessionKey};
use storage::repository::ProfileRepository;
use tracing::warn;

use crate::error::ProfileServiceError;

/// Registration, profile refresh and language choice.
#[derive(Clone)]
pub struct ProfileService {
    clock: Clock,
    profiles: ProfileRepository,
}

impl ProfileService {
    #[must_use]
    pub fn new(clock: Clock, profiles: ProfileRepository) -> Self {
        Self { clock, profiles }
    }

    /// Load the stored profile, if a valid one exists.
    ///
    /// A successful read refreshes the stored freshness stamp; a failed
    /// refresh is logged and does not hide the profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` on backend failures.
    pub async fn load(&self) -> Result<Option<UserProfile>, ProfileServiceError> {
        let Some(profile) = self.profiles.load().await? else {
            return Ok(None);
        };
        if let Err(err) = self.profiles.mark_stored_at(self.clock.now_millis()).await {
            warn!(error = %err, "could not refresh profile timestamp");
        }
        Ok(Some(profile))
    }

    /// Validate, stamp and persist a profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Profile` if validation fails, or
    /// `ProfileServiceError::Storage` if the write fails after cleanup.
    pub async fn save(&self, draft: ProfileDraft) -> Result<UserProfile, ProfileServiceError> {
        let profile = draft.validate()?.touched(self.clock.now());
        self.profiles.save(&profile, self.clock.now_millis()).await?;
        Ok(profile)
    }

    /// Re-save the stored profile to refresh its timestamps.
    ///
    /// Returns `Ok(None)` when there is nothing to refresh.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` on backend failures.
    pub async fn refresh(&self) -> Result<Option<UserProfile>, ProfileServiceError> {
        let Some(profile) = self.profiles.load().await? else {
            return Ok(None);
        };
        let profile = profile.touched(self.clock.now());
        self.profiles.save(&profile, self.clock.now_millis()).await?;
        Ok(Some(profile))
    }

    /// Profession key of the stored learner, or the default profession.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` on backend failures.
    pub async fn profession_key(&self) -> Result<ProfessionKey, ProfileServiceError> {
        Ok(self
            .load()
            .await?
            .map_or_else(ProfessionKey::default, |p| p.profession_key()))
    }

    /// Stored language, English when none was picked.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` on backend failures.
    pub async fn language(&self) -> Result<Language, ProfileServiceError> {
        Ok(self.profiles.language().await?.unwrap_or_default())
    }

    /// Persist the language choice.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the write fails after cleanup.
    pub async fn set_language(&self, language: Language) -> Result<(), ProfileServiceError> {
        self.profiles.set_language(language).await?;
        Ok(())
    }
}
