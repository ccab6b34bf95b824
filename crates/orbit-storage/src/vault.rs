//! High-level async API for the stored session.

use crate::{SecureStorage, StorageError, StorageKeys, StorageResult};
use orbit_core::{CredentialPair, UserRecord};
use std::sync::Arc;
use tracing::warn;

/// Everything the vault holds, as read in one pass.
#[derive(Debug, Clone, Default)]
pub struct StoredSession {
    /// Credential pair, if a complete one is stored.
    pub pair: Option<CredentialPair>,
    /// Cached user record, if present and readable.
    pub user: Option<UserRecord>,
}

/// High-level API for storing and retrieving the session credentials.
///
/// Backends are synchronous; the vault runs every operation on the blocking
/// thread pool so callers never stall the async runtime.
#[derive(Clone)]
pub struct TokenVault {
    storage: Arc<dyn SecureStorage>,
}

impl TokenVault {
    /// Create a new vault over the given storage backend.
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    async fn run<T, F>(&self, op: F) -> StorageResult<T>
    where
        F: FnOnce(&dyn SecureStorage) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || op(storage.as_ref()))
            .await
            .map_err(|err| StorageError::Backend(format!("storage task failed: {err}")))?
    }

    /// Persist a credential pair together with the user record.
    ///
    /// Writes are sequential: the refresh token lands first so that a
    /// partially completed save never leaves an access token without its
    /// refresh counterpart surviving a load (a partial pair reads as
    /// absent).
    pub async fn save(&self, pair: &CredentialPair, user: &UserRecord) -> StorageResult<()> {
        let pair = pair.clone();
        let user_json = serde_json::to_string(user)?;
        self.run(move |storage| {
            storage.set(StorageKeys::REFRESH_TOKEN, &pair.refresh_token)?;
            storage.set(StorageKeys::ACCESS_TOKEN, &pair.access_token)?;
            storage.set(StorageKeys::USER_RECORD, &user_json)
        })
        .await
    }

    /// Read the stored session.
    ///
    /// A partial credential pair or an unreadable user record is normalized
    /// to absent. Callers restoring a session at startup should treat an
    /// `Err` from this method as absent too (fail open to logged-out).
    pub async fn load(&self) -> StorageResult<StoredSession> {
        self.run(|storage| {
            let access = storage.get(StorageKeys::ACCESS_TOKEN)?;
            let refresh = storage.get(StorageKeys::REFRESH_TOKEN)?;

            let pair = match (access, refresh) {
                (Some(access_token), Some(refresh_token)) => Some(CredentialPair {
                    access_token,
                    refresh_token,
                }),
                (None, None) => None,
                _ => {
                    warn!("Partial credential pair in storage, treating as absent");
                    None
                }
            };

            let user = match storage.get(StorageKeys::USER_RECORD)? {
                Some(raw) => match serde_json::from_str(&raw) {
                    Ok(user) => Some(user),
                    Err(err) => {
                        warn!(error = %err, "Stored user record is unreadable, discarding");
                        None
                    }
                },
                None => None,
            };

            Ok(StoredSession { pair, user })
        })
        .await
    }

    /// Erase everything the vault holds.
    pub async fn clear(&self) -> StorageResult<()> {
        self.run(|storage| {
            storage.delete(StorageKeys::ACCESS_TOKEN)?;
            storage.delete(StorageKeys::REFRESH_TOKEN)?;
            storage.delete(StorageKeys::USER_RECORD)?;
            Ok(())
        })
        .await
    }

    /// Replace the cached user record.
    pub async fn update_user(&self, user: &UserRecord) -> StorageResult<()> {
        let user_json = serde_json::to_string(user)?;
        self.run(move |storage| storage.set(StorageKeys::USER_RECORD, &user_json))
            .await
    }

    /// Read the raw access token, if any.
    pub async fn access_token(&self) -> StorageResult<Option<String>> {
        self.run(|storage| storage.get(StorageKeys::ACCESS_TOKEN)).await
    }

    /// Read the raw refresh token, if any.
    pub async fn refresh_token(&self) -> StorageResult<Option<String>> {
        self.run(|storage| storage.get(StorageKeys::REFRESH_TOKEN)).await
    }

    /// Overwrite only the access token, leaving the refresh token and user
    /// record untouched. Used after a successful token refresh.
    pub async fn store_access_token(&self, token: &str) -> StorageResult<()> {
        let token = token.to_string();
        self.run(move |storage| storage.set(StorageKeys::ACCESS_TOKEN, &token))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    fn vault() -> TokenVault {
        TokenVault::new(Arc::new(MemoryStorage::new()))
    }

    fn test_user(id: &str) -> UserRecord {
        serde_json::from_str(&format!(r#"{{"id":"{id}","email":"a@b.com"}}"#)).unwrap()
    }

    fn pair(access: &str, refresh: &str) -> CredentialPair {
        CredentialPair {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let vault = vault();
        vault.save(&pair("T1", "R1"), &test_user("1")).await.unwrap();

        let stored = vault.load().await.unwrap();
        assert_eq!(stored.pair, Some(pair("T1", "R1")));
        assert_eq!(stored.user.unwrap().id, "1");
    }

    #[tokio::test]
    async fn test_clear_empties_everything() {
        let vault = vault();
        vault.save(&pair("T1", "R1"), &test_user("1")).await.unwrap();
        vault.clear().await.unwrap();

        let stored = vault.load().await.unwrap();
        assert!(stored.pair.is_none());
        assert!(stored.user.is_none());
        assert_eq!(vault.access_token().await.unwrap(), None);
        assert_eq!(vault.refresh_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_partial_pair_reads_as_absent() {
        let vault = vault();
        vault.store_access_token("T1").await.unwrap();

        let stored = vault.load().await.unwrap();
        assert!(stored.pair.is_none());
        // The raw getter still sees the token; only the pair view normalizes
        assert_eq!(vault.access_token().await.unwrap(), Some("T1".to_string()));
    }

    #[tokio::test]
    async fn test_store_access_token_leaves_refresh_untouched() {
        let vault = vault();
        vault.save(&pair("T1", "R1"), &test_user("1")).await.unwrap();
        vault.store_access_token("T2").await.unwrap();

        let stored = vault.load().await.unwrap();
        assert_eq!(stored.pair, Some(pair("T2", "R1")));
    }

    #[tokio::test]
    async fn test_update_user_replaces_record() {
        let vault = vault();
        vault.save(&pair("T1", "R1"), &test_user("1")).await.unwrap();
        vault.update_user(&test_user("2")).await.unwrap();

        let stored = vault.load().await.unwrap();
        assert_eq!(stored.user.unwrap().id, "2");
        assert_eq!(stored.pair, Some(pair("T1", "R1")));
    }

    #[tokio::test]
    async fn test_corrupt_user_record_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(StorageKeys::USER_RECORD, "not json").unwrap();
        storage.set(StorageKeys::ACCESS_TOKEN, "T1").unwrap();
        storage.set(StorageKeys::REFRESH_TOKEN, "R1").unwrap();

        let vault = TokenVault::new(storage);
        let stored = vault.load().await.unwrap();
        assert!(stored.user.is_none());
        assert!(stored.pair.is_some());
    }
}
