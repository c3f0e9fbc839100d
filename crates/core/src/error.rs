use thiserror::Error;

use crate::model::{LevelId, ModuleId};

/// Errors raised by the progress mutation path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("level {0} not found")]
    UnknownLevel(LevelId),

    #[error("module {module} not found in level {level}")]
    UnknownModule { level: LevelId, module: ModuleId },

    #[error("level {0} is locked")]
    LevelLocked(LevelId),
}
