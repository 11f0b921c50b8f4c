//! In-process artifact store.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use codevault_core::ObjectKey;
use parking_lot::RwLock;

use super::{ArtifactStore, StoredObject};
use crate::error::UploadError;

/// Keeps artifacts in memory, keyed by their rendered object key.
///
/// Used for dry runs and tests. A store created with
/// [`MemoryStore::unavailable`] rejects every upload.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose uploads always fail as unreachable.
    pub fn unavailable() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            unavailable: true,
        }
    }

    /// Returns the stored keys in order.
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    /// Returns a copy of the object stored under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn put_new(&self, key: &ObjectKey, file: &Path) -> Result<StoredObject, UploadError> {
        if self.unavailable {
            return Err(UploadError::unavailable("memory store is offline"));
        }

        let body = tokio::fs::read(file).await?;
        let size_bytes = body.len() as u64;

        let mut objects = self.objects.write();
        if objects.contains_key(key.as_str()) {
            return Err(UploadError::AlreadyExists {
                key: key.to_string(),
            });
        }
        objects.insert(key.to_string(), body);

        Ok(StoredObject {
            location: format!("memory://{}", key),
            size_bytes,
            version_id: None,
            etag: None,
        })
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, UploadError> {
        Ok(self.objects.read().contains_key(key.as_str()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
