#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod profession;
pub mod progress;
pub mod summary;
pub mod time;

pub use error::ProgressError;
pub use profession::ProfessionKey;
pub use progress::{LearningPath, ModuleCompletion};
pub use time::Clock;
