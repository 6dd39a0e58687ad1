//! In-memory backend.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::backend::{Backend, collections};
use crate::error::{StoreError, StoreResult};

/// In-memory record store.
///
/// Suitable for single-instance deployments and tests. Reads and deletes
/// against a collection that was never created fail with
/// [`StoreError::UnknownCollection`]; writes create the collection.
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStore {
    /// Creates a store with the provider's collections already present.
    #[must_use]
    pub fn new() -> Self {
        Self::with_collections(&collections::ALL)
    }

    /// Creates a store with only the named collections.
    #[must_use]
    pub fn with_collections(names: &[&str]) -> Self {
        let collections = names
            .iter()
            .map(|name| ((*name).to_string(), HashMap::new()))
            .collect();

        Self {
            collections: RwLock::new(collections),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().await;
        let records = collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        Ok(records.get(key).cloned())
    }

    async fn put(&self, collection: &str, key: &str, value: Value) -> StoreResult<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, collection: &str, key: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        records.remove(key);
        Ok(())
    }

    async fn swap(&self, collection: &str, key: &str, value: Value) -> StoreResult<Option<Value>> {
        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        Ok(records.insert(key.to_string(), value))
    }

    async fn take(&self, collection: &str, key: &str) -> StoreResult<Option<Value>> {
        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        Ok(records.remove(key))
    }

    async fn insert(&self, collection: &str, key: &str, value: Value) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();

        if records.contains_key(key) {
            return Ok(false);
        }
        records.insert(key.to_string(), value);
        Ok(true)
    }
}
