use std::sync::Arc;

use sheba_core::{Clock, LearningPath, ProfessionKey};
use storage::repository::Storage;

use crate::error::{AppServicesError, ProgressServiceError};
use crate::fixtures::{FixtureLoader, FixtureSource};
use crate::profile_service::ProfileService;
use crate::progress_service::LearningProgressService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    progress: Arc<LearningProgressService>,
    profiles: Arc<ProfileService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: Storage, clock: Clock, fixtures: Arc<dyn FixtureSource>) -> Self {
        let progress = Arc::new(LearningProgressService::new(
            FixtureLoader::new(fixtures),
            storage.progress.clone(),
        ));
        let profiles = Arc::new(ProfileService::new(clock, storage.profiles.clone()));
        Self {
            storage,
            progress,
            profiles,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        fixtures: Arc<dyn FixtureSource>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(storage, clock, fixtures))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, fixtures: Arc<dyn FixtureSource>) -> Self {
        Self::new(Storage::in_memory(), clock, fixtures)
    }

    /// Load the path for the stored learner's profession.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the backend fails.
    pub async fn current_path(&self) -> Result<LearningPath, ProgressServiceError> {
        let profession = self
            .storage
            .profiles
            .load()
            .await?
            .map_or_else(ProfessionKey::default, |p| p.profession_key());
        self.progress.load_path(&profession).await
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn progress(&self) -> Arc<LearningProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }
}
