use crate::{prefixed, Cache, Error, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use log::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Number of writes between sweeps of expired entries.
const SWEEP_EVERY_WRITES: usize = 256;

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Instant `ttl` from now, capped for lifetimes too long to represent.
fn expiry(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl)
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365 * 30))
}

/// In-process cache backend.
///
/// Entries honor their TTL: an expired entry reads as `KeyNotFound` and is removed on
/// access, and a sweep over the whole map runs every [`SWEEP_EVERY_WRITES`] writes so
/// entries that are never read again don't accumulate.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Purged {removed} expired cache entries");
        }
    }
}

#[async_trait]
impl Cache for MemoryStore {
    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            self.entries.remove(&prefixed(key));
            return Ok(());
        }

        let entry = Entry {
            data: value,
            expires_at: expiry(ttl),
        };
        self.entries.insert(prefixed(key), entry);

        let writes = self.writes.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if writes % SWEEP_EVERY_WRITES == 0 {
            self.purge_expired();
        }

        Ok(())
    }

    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let key = prefixed(key);
        let now = Instant::now();

        if let Some(entry) = self.entries.get(&key) {
            if !entry.is_expired(now) {
                return Ok(entry.data.clone());
            }
        }

        // Guard released above; drop the stale entry if nobody replaced it meanwhile.
        self.entries.remove_if(&key, |_, entry| entry.is_expired(now));
        Err(Error::key_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheErrorKind, CacheExt, KEY_PREFIX};
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Named {
        name: String,
    }

    #[tokio::test]
    async fn test_set_then_get_returns_value() {
        let store = MemoryStore::new();

        store
            .set("test-key", "test-value", Duration::from_secs(60))
            .await
            .unwrap();
        store.set("count", &42, Duration::from_secs(1)).await.unwrap();
        store
            .set(
                "user-key",
                &Named {
                    name: "John".to_string(),
                },
                Duration::from_secs(3600),
            )
            .await
            .unwrap();
        store
            .set(
                "data",
                &HashMap::from([("foo".to_string(), "bar".to_string())]),
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let s: String = store.get("test-key").await.unwrap();
        assert_eq!(s, "test-value");
        let n: i32 = store.get("count").await.unwrap();
        assert_eq!(n, 42);
        let named: Named = store.get("user-key").await.unwrap();
        assert_eq!(named.name, "John");
        let map: HashMap<String, String> = store.get("data").await.unwrap();
        assert_eq!(map.get("foo").map(String::as_str), Some("bar"));
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let store = MemoryStore::new();

        let err = store.get::<String>("non-existent").await.unwrap_err();
        assert_eq!(err.error_kind, CacheErrorKind::KeyNotFound);
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_second_set_overwrites_first() {
        let store = MemoryStore::new();

        store.set("test-key", "initial", Duration::from_secs(60)).await.unwrap();
        store.set("test-key", "updated", Duration::from_secs(60)).await.unwrap();

        let result: String = store.get("test-key").await.unwrap();
        assert_eq!(result, "updated");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_are_stored_with_prefix() {
        let store = MemoryStore::new();

        store.set("test", "data", Duration::from_secs(60)).await.unwrap();

        assert!(store.entries.contains_key(&format!("{KEY_PREFIX}test")));
        assert!(!store.entries.contains_key("test"));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_deserialization_error() {
        let store = MemoryStore::new();

        store.set("count", &42, Duration::from_secs(60)).await.unwrap();

        let err = store.get::<Named>("count").await.unwrap_err();
        assert_eq!(err.error_kind, CacheErrorKind::Deserialization);
    }

    #[tokio::test]
    async fn test_unencodable_value_is_serialization_error() {
        let store = MemoryStore::new();
        // JSON object keys must be strings
        let value = HashMap::from([((1, 2), "pair")]);

        let err = store
            .set("pairs", &value, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(err.error_kind, CacheErrorKind::Serialization);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let store = MemoryStore::new();

        store.set("short", "lived", Duration::from_secs(5)).await.unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(store.get::<String>("short").await.unwrap(), "lived");

        tokio::time::advance(Duration::from_secs(1)).await;
        let err = store.get::<String>("short").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.is_empty(), "expired entry should be dropped on read");
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_sweep_expired_entries() {
        let store = MemoryStore::new();

        store.set("stale", "value", Duration::from_secs(1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        for i in 0..SWEEP_EVERY_WRITES {
            store
                .set(&format!("fresh-{i}"), &i, Duration::from_secs(60))
                .await
                .unwrap();
        }

        assert!(!store.entries.contains_key(&format!("{KEY_PREFIX}stale")));
        assert_eq!(store.len(), SWEEP_EVERY_WRITES);
    }

    #[tokio::test]
    async fn test_concurrent_writers_through_dyn_cache() {
        let store: Arc<dyn Cache> = Arc::new(MemoryStore::new());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .set(&format!("key-{i}"), &i, Duration::from_secs(60))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for i in 0..16 {
            let value: i32 = store.get(&format!("key-{i}")).await.unwrap();
            assert_eq!(value, i);
        }
    }

    #[tokio::test]
    async fn test_zero_ttl_removes_the_key() {
        let store = MemoryStore::new();
        store.set("gone", "soon", Duration::from_secs(60)).await.unwrap();

        store.set("gone", "now", Duration::ZERO).await.unwrap();

        let err = store.get::<String>("gone").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_is_capped() {
        let store = MemoryStore::new();

        store.set("forever", "ish", Duration::MAX).await.unwrap();

        assert_eq!(store.get::<String>("forever").await.unwrap(), "ish");
    }
}
