use sheba_core::model::{Language, ProfileDraft, ProgressSnapshot, UserProfile};
use sheba_core::ProfessionKey;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::kv::{
    CORRUPT_PROGRESS_KEY_PREFIX, InMemoryStore, KeyValueStore, PROGRESS_KEY_PREFIX,
    write_with_cleanup,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("storage quota exceeded ({needed} bytes needed, limit {limit})")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

const USER_DATA_KEY: &str = "userData";
const USER_DATA_STORED_KEY: &str = "userDataStored";
const USER_DATA_TIMESTAMP_KEY: &str = "userDataTimestamp";
const LANGUAGE_KEY: &str = "language";
const LANGUAGE_SELECTED_KEY: &str = "languageSelected";

/// Storage key of a profession's snapshot.
#[must_use]
pub fn progress_key(profession: &ProfessionKey) -> String {
    format!("{PROGRESS_KEY_PREFIX}{profession}")
}

/// Where an unreadable snapshot is parked before it is treated as absent.
///
/// Lives outside the progress namespace, so quota cleanup may drop it.
#[must_use]
pub fn corrupt_backup_key(profession: &ProfessionKey) -> String {
    format!("{CORRUPT_PROGRESS_KEY_PREFIX}{profession}")
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Reads and writes per-profession progress snapshots.
#[derive(Clone)]
pub struct ProgressRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ProgressRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the saved snapshot for `profession`.
    ///
    /// A missing key and an unparsable value both yield `Ok(None)`. The
    /// unparsable value is first copied to [`corrupt_backup_key`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backend itself fails.
    pub async fn load(
        &self,
        profession: &ProfessionKey,
    ) -> Result<Option<ProgressSnapshot>, StorageError> {
        let Some(raw) = self.store.get(&progress_key(profession)).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<ProgressSnapshot>(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!(%profession, error = %err, "discarding unreadable progress snapshot");
                if let Err(backup_err) = self.store.set(&corrupt_backup_key(profession), &raw).await
                {
                    warn!(%profession, error = %backup_err, "could not back up unreadable snapshot");
                }
                Ok(None)
            }
        }
    }

    /// Persist `snapshot` for `profession`, cleaning up once on quota exhaustion.
    ///
    /// A successful save supersedes any backup of an unreadable snapshot,
    /// so the backup is removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization fails or the write fails after
    /// the cleanup retry.
    pub async fn save(
        &self,
        profession: &ProfessionKey,
        snapshot: &ProgressSnapshot,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let key = progress_key(profession);
        write_with_cleanup(self.store.as_ref(), &[(key.as_str(), json.as_str())]).await?;
        self.store.remove(&corrupt_backup_key(profession)).await
    }

    /// Drop saved progress for `profession`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn reset(&self, profession: &ProfessionKey) -> Result<(), StorageError> {
        self.store.remove(&progress_key(profession)).await
    }
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

/// Reads and writes the learner profile and language choice.
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the stored profile.
    ///
    /// Returns `Ok(None)` when it is missing, unparsable, or lacks name/phone.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backend itself fails.
    pub async fn load(&self) -> Result<Option<UserProfile>, StorageError> {
        let Some(raw) = self.store.get(USER_DATA_KEY).await? else {
            return Ok(None);
        };
        let draft = match serde_json::from_str::<ProfileDraft>(&raw) {
            Ok(draft) => draft,
            Err(err) => {
                warn!(error = %err, "stored profile is not valid JSON");
                return Ok(None);
            }
        };
        match draft.validate() {
            Ok(profile) => Ok(Some(profile)),
            Err(err) => {
                warn!(error = %err, "stored profile appears corrupted");
                Ok(None)
            }
        }
    }

    /// Whether a valid profile exists and was marked as stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn has_profile(&self) -> Result<bool, StorageError> {
        let stored = self.store.get(USER_DATA_STORED_KEY).await?;
        Ok(stored.as_deref() == Some("true") && self.load().await?.is_some())
    }

    /// Persist `profile` with its freshness markers.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization fails or the write fails after
    /// the cleanup retry.
    pub async fn save(&self, profile: &UserProfile, stored_at_millis: i64) -> Result<(), StorageError> {
        let json = serde_json::to_string(&profile.to_draft())
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let stamp = stored_at_millis.to_string();
        write_with_cleanup(
            self.store.as_ref(),
            &[
                (USER_DATA_KEY, json.as_str()),
                (USER_DATA_STORED_KEY, "true"),
                (USER_DATA_TIMESTAMP_KEY, stamp.as_str()),
            ],
        )
        .await
    }

    /// Refresh the freshness stamp without rewriting the profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails after the cleanup retry.
    pub async fn mark_stored_at(&self, stored_at_millis: i64) -> Result<(), StorageError> {
        let stamp = stored_at_millis.to_string();
        write_with_cleanup(
            self.store.as_ref(),
            &[(USER_DATA_TIMESTAMP_KEY, stamp.as_str())],
        )
        .await
    }

    /// Stored freshness stamp in epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn stored_at_millis(&self) -> Result<Option<i64>, StorageError> {
        let raw = self.store.get(USER_DATA_TIMESTAMP_KEY).await?;
        Ok(raw.and_then(|v| v.parse().ok()))
    }

    /// Selected interface language, if the learner picked one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn language(&self) -> Result<Option<Language>, StorageError> {
        let raw = self.store.get(LANGUAGE_KEY).await?;
        Ok(raw.and_then(|v| v.parse().ok()))
    }

    /// Record the learner's language choice.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails after the cleanup retry.
    pub async fn set_language(&self, language: Language) -> Result<(), StorageError> {
        write_with_cleanup(
            self.store.as_ref(),
            &[(LANGUAGE_KEY, language.code()), (LANGUAGE_SELECTED_KEY, "true")],
        )
        .await
    }
}

/// Repositories sharing one key-value backend.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
    pub progress: ProgressRepository,
    pub profiles: ProfileRepository,
}

impl Storage {
    #[must_use]
    pub fn from_store(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            progress: ProgressRepository::new(Arc::clone(&kv)),
            profiles: ProfileRepository::new(Arc::clone(&kv)),
            kv,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheba_core::model::{LevelId, LevelSnapshot, ModuleId, ModuleSnapshot};

    fn snapshot() -> ProgressSnapshot {
        ProgressSnapshot {
            levels: vec![LevelSnapshot {
                id: LevelId::new(1),
                completed: false,
                unlocked: Some(true),
                modules: vec![ModuleSnapshot {
                    id: ModuleId::new(1),
                    completed: true,
                }],
            }],
        }
    }

    #[tokio::test]
    async fn round_trips_snapshot() {
        let storage = Storage::in_memory();
        let key = ProfessionKey::normalize("Electrician");
        storage.progress.save(&key, &snapshot()).await.unwrap();
        let loaded = storage.progress.load(&key).await.unwrap();
        assert_eq!(loaded, Some(snapshot()));
        assert!(
            storage
                .kv
                .get("learningProgress_electrician")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn corrupt_snapshot_loads_as_absent_and_is_backed_up() {
        let storage = Storage::in_memory();
        let key = ProfessionKey::normalize("plumber");
        storage
            .kv
            .set("learningProgress_plumber", "{not json")
            .await
            .unwrap();

        assert_eq!(storage.progress.load(&key).await.unwrap(), None);
        assert_eq!(
            storage
                .kv
                .get("corruptProgress_plumber")
                .await
                .unwrap()
                .as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn missing_snapshot_is_absent() {
        let storage = Storage::in_memory();
        let key = ProfessionKey::default();
        assert_eq!(storage.progress.load(&key).await.unwrap(), None);
        storage.progress.save(&key, &snapshot()).await.unwrap();
        storage.progress.reset(&key).await.unwrap();
        assert_eq!(storage.progress.load(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_recovers_from_quota_by_dropping_non_essential_keys() {
        let store = Arc::new(InMemoryStore::with_quota(256));
        let storage = Storage::from_store(store.clone());
        store.set("userData", "{}").await.unwrap();
        store.set("assessmentResult", &"x".repeat(150)).await.unwrap();

        let key = ProfessionKey::normalize("Electrician");
        storage.progress.save(&key, &snapshot()).await.unwrap();

        assert_eq!(store.get("assessmentResult").await.unwrap(), None);
        assert!(store.get("userData").await.unwrap().is_some());
        assert_eq!(storage.progress.load(&key).await.unwrap(), Some(snapshot()));
    }

    #[tokio::test]
    async fn backup_of_unreadable_snapshot_gives_way_to_a_new_save() {
        let store = Arc::new(InMemoryStore::with_quota(300));
        let storage = Storage::from_store(store.clone());
        let key = ProfessionKey::default();
        store
            .set("learningProgress_electrician", &"{".repeat(100))
            .await
            .unwrap();

        assert_eq!(storage.progress.load(&key).await.unwrap(), None);
        assert!(store.get("corruptProgress_electrician").await.unwrap().is_some());

        let big = ProgressSnapshot {
            levels: (1..=3)
                .map(|id| LevelSnapshot {
                    id: LevelId::new(id),
                    completed: false,
                    unlocked: Some(id == 1),
                    modules: vec![ModuleSnapshot {
                        id: ModuleId::new(id),
                        completed: false,
                    }],
                })
                .collect(),
        };
        // the save only fits once the backup is gone
        let snapshot_bytes = "learningProgress_electrician".len()
            + serde_json::to_string(&big).unwrap().len();
        assert!(snapshot_bytes + "corruptProgress_electrician".len() + 100 > 300);
        assert!(snapshot_bytes <= 300);

        storage.progress.save(&key, &big).await.unwrap();
        assert_eq!(storage.progress.load(&key).await.unwrap(), Some(big));
        assert_eq!(
            store.keys().await.unwrap(),
            vec!["learningProgress_electrician".to_string()]
        );
    }

    #[tokio::test]
    async fn successful_save_removes_stale_backup() {
        let storage = Storage::in_memory();
        let key = ProfessionKey::normalize("plumber");
        storage
            .kv
            .set("learningProgress_plumber", "not json")
            .await
            .unwrap();
        assert_eq!(storage.progress.load(&key).await.unwrap(), None);

        storage.progress.save(&key, &snapshot()).await.unwrap();
        assert_eq!(storage.kv.get("corruptProgress_plumber").await.unwrap(), None);
    }

    fn plain_profile() -> UserProfile {
        ProfileDraft {
            name: "Rahim".into(),
            phone: "01700000000".into(),
            ..ProfileDraft::default()
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn profile_save_recovers_from_quota() {
        let profile = plain_profile();
        let stamp = 1_700_000_000_000_i64;
        let batch = "userData".len()
            + serde_json::to_string(&profile.to_draft()).unwrap().len()
            + "userDataStored".len()
            + "true".len()
            + "userDataTimestamp".len()
            + stamp.to_string().len();
        let selected = "languageSelected".len() + "true".len();

        let store = Arc::new(InMemoryStore::with_quota(batch + selected + 20));
        let storage = Storage::from_store(store.clone());
        storage.profiles.set_language(Language::Bn).await.unwrap();
        store.set("assessmentResult", "0123456789").await.unwrap();

        storage.profiles.save(&profile, stamp).await.unwrap();

        assert_eq!(store.get("assessmentResult").await.unwrap(), None);
        assert_eq!(store.get("language").await.unwrap(), None);
        assert_eq!(
            store.get("languageSelected").await.unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(storage.profiles.load().await.unwrap(), Some(profile));
        assert!(storage.profiles.has_profile().await.unwrap());
        assert_eq!(storage.profiles.stored_at_millis().await.unwrap(), Some(stamp));
        // the language falls back to the default once its code is dropped
        assert_eq!(storage.profiles.language().await.unwrap(), None);
    }

    #[tokio::test]
    async fn language_choice_recovers_from_quota() {
        let store = Arc::new(InMemoryStore::with_quota(48));
        let storage = Storage::from_store(store.clone());
        store.set("assessmentResult", "0123456789abcdef").await.unwrap();

        storage.profiles.set_language(Language::En).await.unwrap();

        assert_eq!(store.get("assessmentResult").await.unwrap(), None);
        assert_eq!(storage.profiles.language().await.unwrap(), Some(Language::En));
    }

    #[tokio::test]
    async fn profile_integrity_and_language() {
        let storage = Storage::in_memory();
        assert!(!storage.profiles.has_profile().await.unwrap());

        storage
            .kv
            .set("userData", r#"{"name":"Rahim","phone":""}"#)
            .await
            .unwrap();
        assert!(storage.profiles.load().await.unwrap().is_none());

        let profile = ProfileDraft {
            name: "Rahim".into(),
            phone: "01700000000".into(),
            profession: Some("Plumber".into()),
            ..ProfileDraft::default()
        }
        .validate()
        .unwrap();
        storage.profiles.save(&profile, 1_700_000_000_000).await.unwrap();
        assert!(storage.profiles.has_profile().await.unwrap());
        assert_eq!(
            storage.profiles.stored_at_millis().await.unwrap(),
            Some(1_700_000_000_000)
        );

        assert_eq!(storage.profiles.language().await.unwrap(), None);
        storage.profiles.set_language(Language::Bn).await.unwrap();
        assert_eq!(storage.profiles.language().await.unwrap(), Some(Language::Bn));

        storage.profiles.mark_stored_at(1_700_000_060_000).await.unwrap();
        assert_eq!(
            storage.profiles.stored_at_millis().await.unwrap(),
            Some(1_700_000_060_000)
        );
    }
}
