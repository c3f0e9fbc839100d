//! Shared error types for the services crate.

use thiserror::Error;

use sheba_core::ProgressError;
use sheba_core::model::ProfileError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while fetching the curriculum document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FixtureError {
    #[error("could not read curriculum file: {0}")]
    Io(#[from] std::io::Error),
    #[error("curriculum request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("curriculum document is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors emitted by `LearningProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    /// The change is applied in memory but could not be saved.
    #[error("progress could not be saved: {source}")]
    Persist {
        leveled_up: bool,
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
