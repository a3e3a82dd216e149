//! Key-value hash store the user records live in.
//!
//! The store is consumed through the [`HashStore`] capability trait so the
//! user store never knows whether it talks to Redis or to the in-process
//! [`MemoryStore`]. All values cross this boundary as strings.

pub mod keys;
pub mod memory;
pub mod redis_store;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, StoreBackend};

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Shared store handle (Arc-wrapped for sharing across handlers and tasks)
pub type Store = Arc<dyn HashStore>;

/// Errors reported by a store backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend failure: {message}")]
    Backend { message: String },

    #[error("store connection pool failure: {message}")]
    Pool { message: String },
}

/// Hash and set operations the user store needs from its backend
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Read one field of a hash, `None` when the field or hash is missing
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Write one field, creating the hash if needed
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    /// Write several fields in one request
    async fn hash_set_multiple(
        &self,
        key: &str,
        fields: &[(&str, &str)],
    ) -> Result<(), StoreError>;

    /// Create a hash and register it in an index set, unless it already exists.
    ///
    /// The hash counts as existing when `marker.0` is present. Otherwise the
    /// marker, every entry of `fields` and the `member` of `index_key` are
    /// written as one step: concurrent callers see either all of it or none
    /// of it, and at most one of them gets `true`.
    async fn create_hash_if_absent(
        &self,
        key: &str,
        marker: (&str, &str),
        fields: &[(&str, &str)],
        index_key: &str,
        member: &str,
    ) -> Result<bool, StoreError>;

    /// Read every field of a hash; a missing hash yields an empty map
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Atomically add `delta` to an integer field (missing counts as 0)
    async fn hash_increment(&self, key: &str, field: &str, delta: i64)
        -> Result<i64, StoreError>;

    /// Remove a hash and its `member` entry in `index_key` as one step.
    ///
    /// Returns `true` when either of the two was present.
    async fn delete_hash_and_member(
        &self,
        key: &str,
        index_key: &str,
        member: &str,
    ) -> Result<bool, StoreError>;

    /// Add a member to a set, returning whether it was newly added
    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// List the members of a set (unordered)
    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Open the store selected by the configuration
pub async fn open_store(config: &Config) -> Result<Store, StoreError> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory store (data is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.redis_url, config.redis_pool_size).await?;
            Ok(Arc::new(store))
        }
    }
}
