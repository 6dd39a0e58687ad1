//! The backend contract.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreResult;

/// Well-known collection names.
pub mod collections {
    /// Registered clients.
    pub const CLIENTS: &str = "clients";

    /// Authorization codes.
    pub const CODES: &str = "codes";

    /// Issued access tokens.
    pub const TOKENS: &str = "tokens";

    /// Issued refresh tokens.
    pub const REFRESH: &str = "refresh";

    /// All collections the provider writes to.
    pub const ALL: [&str; 4] = [CLIENTS, CODES, TOKENS, REFRESH];
}

/// Asynchronous JSON key-value store.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Reads a record. `Ok(None)` when the key is absent.
    async fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Value>>;

    /// Writes a record, replacing any previous value.
    async fn put(&self, collection: &str, key: &str, value: Value) -> StoreResult<()>;

    /// Deletes a record.
    async fn del(&self, collection: &str, key: &str) -> StoreResult<()>;

    /// Atomically replaces a record and returns the previous value.
    ///
    /// Used where a read-then-write would race, such as marking an
    /// authorization code as used.
    async fn swap(&self, collection: &str, key: &str, value: Value) -> StoreResult<Option<Value>>;

    /// Atomically removes a record and returns it. `Ok(None)` when the key
    /// is absent, so of two concurrent callers only one sees the value.
    async fn take(&self, collection: &str, key: &str) -> StoreResult<Option<Value>>;

    /// Writes a record only if the key is absent. Returns `false` and
    /// leaves the existing record untouched otherwise.
    async fn insert(&self, collection: &str, key: &str, value: Value) -> StoreResult<bool>;
}

/// Typed helpers over [`Backend`].
#[async_trait]
pub trait BackendExt: Backend {
    /// Reads and deserializes a record.
    async fn get_as<T>(&self, collection: &str, key: &str) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(collection, key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serializes and writes a record.
    async fn put_as<T>(&self, collection: &str, key: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(value)?;
        self.put(collection, key, value).await
    }

    /// Atomically removes and deserializes a record.
    async fn take_as<T>(&self, collection: &str, key: &str) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.take(collection, key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serializes and writes a record if the key is absent.
    async fn insert_as<T>(&self, collection: &str, key: &str, value: &T) -> StoreResult<bool>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(value)?;
        self.insert(collection, key, value).await
    }
}

impl<B: Backend + ?Sized> BackendExt for B {}
