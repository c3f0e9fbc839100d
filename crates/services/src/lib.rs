#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod fixtures;
pub mod profile_service;
pub mod progress_service;

pub use sheba_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, FixtureError, ProfileServiceError, ProgressServiceError};
pub use fixtures::{
    FileFixtureSource, FixtureLoader, FixtureSource, HttpFixtureSource, StaticFixtureSource,
};
pub use profile_service::ProfileService;
pub use progress_service::LearningProgressService;
