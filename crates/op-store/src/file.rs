//! File-backed backend.
//!
//! Each record lives at `<root>/<collection>/<key>.json`, with the key
//! percent-encoded so client identifiers that are URLs stay one path
//! segment.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;

use crate::backend::Backend;
use crate::error::{StoreError, StoreResult};

/// Record store keeping one JSON file per record.
///
/// A missing file reads as `None`; deleting one fails with
/// [`StoreError::NotFound`]. [`Backend::swap`], [`Backend::take`] and
/// [`Backend::insert`] are atomic within this process only.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store rooted at `root`. Directories are created on write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, collection: &str, key: &str) -> StoreResult<PathBuf> {
        check_segment(collection)?;
        let file = urlencoding::encode(key);
        check_segment(&file)?;
        Ok(self.root.join(collection).join(format!("{file}.json")))
    }

    async fn read(&self, path: &Path) -> StoreResult<Option<Value>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, path: &Path, value: &Value) -> StoreResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await?;

        tracing::trace!(path = %path.display(), "wrote record");
        Ok(())
    }
}

/// Rejects names that would escape the collection directory.
fn check_segment(segment: &str) -> StoreResult<()> {
    let invalid = segment.is_empty()
        || segment.starts_with('.')
        || segment.contains(['/', '\\', '\0']);

    if invalid {
        return Err(StoreError::InvalidKey(segment.to_string()));
    }
    Ok(())
}

#[async_trait]
impl Backend for FileStore {
    async fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Value>> {
        let path = self.record_path(collection, key)?;
        self.read(&path).await
    }

    async fn put(&self, collection: &str, key: &str, value: Value) -> StoreResult<()> {
        let path = self.record_path(collection, key)?;
        let _guard = self.write_lock.lock().await;
        self.write(&path, &value).await
    }

    async fn del(&self, collection: &str, key: &str) -> StoreResult<()> {
        let path = self.record_path(collection, key)?;
        let _guard = self.write_lock.lock().await;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::not_found(collection, key))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn swap(&self, collection: &str, key: &str, value: Value) -> StoreResult<Option<Value>> {
        let path = self.record_path(collection, key)?;
        let _guard = self.write_lock.lock().await;

        let previous = self.read(&path).await?;
        self.write(&path, &value).await?;
        Ok(previous)
    }

    async fn take(&self, collection: &str, key: &str) -> StoreResult<Option<Value>> {
        let path = self.record_path(collection, key)?;
        let _guard = self.write_lock.lock().await;

        let Some(previous) = self.read(&path).await? else {
            return Ok(None);
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(Some(previous)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert(&self, collection: &str, key: &str, value: Value) -> StoreResult<bool> {
        let path = self.record_path(collection, key)?;
        let _guard = self.write_lock.lock().await;

        if self.read(&path).await?.is_some() {
            return Ok(false);
        }
        self.write(&path, &value).await?;
        Ok(true)
    }
}
