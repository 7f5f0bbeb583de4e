//! Expiring key/value storage shared by sessions and other short-lived state.
//!
//! Two interchangeable backends implement [`Cache`]:
//!
//! - [`MemoryStore`]: an in-process map, used when no shared store is configured.
//! - [`RedisStore`]: a Redis server shared between every server process.
//!
//! Both store raw bytes under keys prefixed with [`KEY_PREFIX`]. Typed access goes
//! through [`CacheExt`], which serializes values as JSON so that either backend
//! can read what the other wrote.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

pub mod error;
pub mod memory;
pub mod redis_store;

pub use error::{CacheErrorKind, Error};
pub use memory::MemoryStore;
pub use redis_store::{RedisSettings, RedisStore, DEFAULT_REDIS_PORT};

/// Namespace applied to every key so other tenants of the same store don't collide.
pub const KEY_PREFIX: &str = "groceries:";

pub type Result<T> = core::result::Result<T, Error>;

/// Byte-level contract implemented by each backend.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Store `value` under `key` until `ttl` elapses. Overwrites any existing entry.
    /// A zero `ttl` removes the key instead.
    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Load the bytes stored under `key`, or `KeyNotFound` if absent or expired.
    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>>;
}

/// Typed helpers available on every [`Cache`], including `dyn Cache`.
#[async_trait]
pub trait CacheExt: Cache {
    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let data = serde_json::to_vec(value).map_err(Error::serialization)?;
        self.set_bytes(key, data, ttl).await
    }

    async fn get<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let data = self.get_bytes(key).await?;
        serde_json::from_slice(&data).map_err(Error::deserialization)
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}

pub(crate) fn prefixed(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}
