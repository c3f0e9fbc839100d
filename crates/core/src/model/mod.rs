pub mod fixture;
mod ids;
mod level;
mod localized;
mod profile;
mod snapshot;

pub use fixture::{FixtureDocument, FixtureLevel, FixtureModule};
pub use ids::{LevelId, ModuleId, ParseIdError};
pub use level::{Level, Module};
pub use localized::{Language, LocalizedText, ParseLanguageError};
pub use profile::{ProfileDraft, ProfileError, UserProfile};
pub use snapshot::{LevelSnapshot, ModuleSnapshot, ProgressSnapshot};
