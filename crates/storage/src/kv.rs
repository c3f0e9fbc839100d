use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::repository::StorageError;

/// Keys that survive a quota cleanup besides progress keys.
pub const ESSENTIAL_KEYS: [&str; 4] = [
    "userData",
    "userDataStored",
    "userDataTimestamp",
    "languageSelected",
];

/// Namespace prefix of per-profession progress snapshots.
pub const PROGRESS_KEY_PREFIX: &str = "learningProgress_";

/// Namespace prefix of backups of unreadable snapshots. Not preserved.
pub const CORRUPT_PROGRESS_KEY_PREFIX: &str = "corruptProgress_";

/// Flat string store in the shape of browser `localStorage`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::QuotaExceeded` when the write does not fit,
    /// or other storage errors.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key; missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Whether a quota cleanup keeps `key`.
#[must_use]
pub fn is_preserved_key(key: &str) -> bool {
    ESSENTIAL_KEYS.contains(&key) || key.starts_with(PROGRESS_KEY_PREFIX)
}

/// Remove every key that [`is_preserved_key`] rejects. Returns how many went.
///
/// # Errors
///
/// Returns `StorageError` if listing or removing fails.
pub async fn cleanup_non_essential(store: &dyn KeyValueStore) -> Result<usize, StorageError> {
    let mut removed = 0;
    for key in store.keys().await? {
        if !is_preserved_key(&key) {
            store.remove(&key).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Apply `writes` in order. On quota exhaustion run one cleanup pass and
/// retry the whole batch exactly once.
///
/// # Errors
///
/// Returns the retry's error if the batch still fails, or any non-quota
/// error from the first attempt.
pub async fn write_with_cleanup(
    store: &dyn KeyValueStore,
    writes: &[(&str, &str)],
) -> Result<(), StorageError> {
    match write_all(store, writes).await {
        Err(StorageError::QuotaExceeded { .. }) => {
            let removed = cleanup_non_essential(store).await?;
            warn!(removed, "storage quota exceeded, removed non-essential keys and retrying");
            write_all(store, writes).await.inspect_err(|err| {
                warn!(error = %err, "write failed after quota cleanup");
            })
        }
        other => other,
    }
}

async fn write_all(store: &dyn KeyValueStore, writes: &[(&str, &str)]) -> Result<(), StorageError> {
    for (key, value) in writes {
        store.set(key, value).await?;
        debug!(key, bytes = value.len(), "stored value");
    }
    Ok(())
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// In-memory store with an optional byte quota over keys plus values.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently used (keys plus values).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn used_bytes(&self) -> Result<usize, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(usage(&guard))
    }
}

fn usage(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if let Some(quota) = self.quota_bytes {
            let replaced = guard.get(key).map_or(0, |old| key.len() + old.len());
            let needed = usage(&guard) - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    needed,
                    limit: quota,
                });
            }
        }
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_identity_and_progress_keys() {
        assert!(is_preserved_key("userData"));
        assert!(is_preserved_key("languageSelected"));
        assert!(is_preserved_key("learningProgress_plumber"));
        assert!(!is_preserved_key("assessmentResult"));
        assert!(!is_preserved_key("language"));
        assert!(!is_preserved_key("corruptProgress_plumber"));
    }

    #[tokio::test]
    async fn quota_counts_keys_and_values() {
        let store = InMemoryStore::with_quota(10);
        store.set("ab", "1234").await.unwrap();
        assert_eq!(store.used_bytes().unwrap(), 6);
        // replacing a value only counts the difference
        store.set("ab", "12345678").await.unwrap();
        let err = store.set("c", "12").await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { needed: 13, limit: 10 }));
    }

    #[tokio::test]
    async fn cleanup_then_retry_frees_room() {
        let store = InMemoryStore::with_quota(64);
        store.set("userData", "{}").await.unwrap();
        store.set("learningProgress_plumber", "{}").await.unwrap();
        store.set("assessmentResult", "xxxxxxxxxx").await.unwrap();

        write_with_cleanup(&store, &[("learningProgress_x", "0123456")])
            .await
            .unwrap();

        let keys = store.keys().await.unwrap();
        assert!(!keys.contains(&"assessmentResult".to_string()));
        assert!(keys.contains(&"userData".to_string()));
        assert!(keys.contains(&"learningProgress_plumber".to_string()));
        assert_eq!(
            store.get("learningProgress_x").await.unwrap().as_deref(),
            Some("0123456")
        );
    }

    #[tokio::test]
    async fn retry_failure_is_reported() {
        let store = InMemoryStore::with_quota(8);
        let err = write_with_cleanup(&store, &[("learningProgress_x", "{}")])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
    }
}
