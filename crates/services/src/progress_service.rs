use sheba_core::model::{LevelId, ModuleId};
use sheba_core::summary::ProgressSummary;
use sheba_core::{LearningPath, ProfessionKey};
use storage::repository::ProgressRepository;
use tracing::{debug, info};

use crate::error::ProgressServiceError;
use crate::fixtures::FixtureLoader;

/// Loads learning paths and records module completions.
#[derive(Clone)]
pub struct LearningProgressService {
    fixtures: FixtureLoader,
    progress: ProgressRepository,
}

impl LearningProgressService {
    #[must_use]
    pub fn new(fixtures: FixtureLoader, progress: ProgressRepository) -> Self {
        Self { fixtures, progress }
    }

    /// Build the working path for `profession` from the curriculum and saved progress.
    ///
    /// An unavailable curriculum yields an empty path; unreadable saved
    /// progress counts as none.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the storage backend fails.
    pub async fn load_path(
        &self,
        profession: &ProfessionKey,
    ) -> Result<LearningPath, ProgressServiceError> {
        let fixture = self.fixtures.levels_or_empty(profession).await;
        let snapshot = self.progress.load(profession).await?;
        debug!(
            %profession,
            levels = fixture.len(),
            restored = snapshot.is_some(),
            "loaded learning path"
        );
        Ok(LearningPath::new(profession.clone(), &fixture, snapshot.as_ref()))
    }

    /// Complete a module, then save the path under its profession.
    ///
    /// Returns whether the module's level was completed by this call.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Progress` for unknown ids or a locked
    /// level (nothing changes). Returns `ProgressServiceError::Persist` when
    /// the save fails; `path` already holds the new state then.
    pub async fn complete_module(
        &self,
        path: &mut LearningPath,
        level_id: LevelId,
        module_id: ModuleId,
    ) -> Result<bool, ProgressServiceError> {
        let leveled_up = path.complete_module(level_id, module_id)?;
        if leveled_up {
            info!(profession = %path.profession(), level = %level_id, "level completed");
        }

        self.progress
            .save(path.profession(), &path.snapshot())
            .await
            .map_err(|source| ProgressServiceError::Persist { leveled_up, source })?;
        Ok(leveled_up)
    }

    /// Forget saved progress for `profession`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the backend fails.
    pub async fn reset(&self, profession: &ProfessionKey) -> Result<(), ProgressServiceError> {
        self.progress.reset(profession).await?;
        Ok(())
    }

    #[must_use]
    pub fn summary(path: &LearningPath) -> ProgressSummary {
        ProgressSummary::from_levels(path.levels())
    }
}
