#![forbid(unsafe_code)]

pub mod kv;
pub mod repository;
pub mod sqlite;

pub use kv::{InMemoryStore, KeyValueStore};
pub use repository::{ProfileRepository, ProgressRepository, Storage, StorageError};
