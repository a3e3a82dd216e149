use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{HashStore, StoreError};

/// In-process store with Redis-like hash and set semantics.
///
/// Every operation on one key holds that key's shard lock for its whole
/// duration, which makes `create_hash_if_absent` and `hash_increment` atomic.
/// Operations touching both maps lock the hash entry first, then the set.
#[derive(Debug, Default)]
pub struct MemoryStore {
    hashes: DashMap<String, HashMap<String, String>>,
    sets: DashMap<String, BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HashStore for MemoryStore {
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field).cloned()))
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_set_multiple(
        &self,
        key: &str,
        fields: &[(&str, &str)],
    ) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut hash = self.hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert((*field).to_string(), (*value).to_string());
        }
        Ok(())
    }

    async fn create_hash_if_absent(
        &self,
        key: &str,
        marker: (&str, &str),
        fields: &[(&str, &str)],
        index_key: &str,
        member: &str,
    ) -> Result<bool, StoreError> {
        let (marker_field, marker_value) = marker;
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        if hash.contains_key(marker_field) {
            return Ok(false);
        }

        // The hash entry stays locked until index, marker and fields are in
        self.sets
            .entry(index_key.to_string())
            .or_default()
            .insert(member.to_string());
        hash.insert(marker_field.to_string(), marker_value.to_string());
        for (field, value) in fields {
            hash.insert((*field).to_string(), (*value).to_string());
        }
        Ok(true)
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        Ok(self
            .hashes
            .get(key)
            .map(|hash| hash.value().clone())
            .unwrap_or_default())
    }

    async fn hash_increment(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        let current = match hash.get(field) {
            Some(value) => value.parse::<i64>().map_err(|_| StoreError::Backend {
                message: format!("hash value is not an integer: {value}"),
            })?,
            None => 0,
        };
        let next = current.checked_add(delta).ok_or_else(|| StoreError::Backend {
            message: "increment or decrement would overflow".to_string(),
        })?;
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn delete_hash_and_member(
        &self,
        key: &str,
        index_key: &str,
        member: &str,
    ) -> Result<bool, StoreError> {
        let entry = self.hashes.entry(key.to_string());
        let removed_member = self
            .sets
            .get_mut(index_key)
            .map(|mut set| set.remove(member))
            .unwrap_or(false);
        let removed_hash = match entry {
            Entry::Occupied(occupied) => {
                occupied.remove();
                true
            }
            Entry::Vacant(_) => false,
        };
        Ok(removed_hash || removed_member)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        Ok(self
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
