//! Local directory artifact store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use codevault_core::ObjectKey;
use tracing::info;

use super::{ArtifactStore, StoredObject};
use crate::error::UploadError;

/// Stores artifacts as files under a root directory, one path segment per
/// key segment.
///
/// The archive is copied to a staging file unique to the call and then
/// hard-linked into place. Linking fails when the target exists, so an
/// artifact is never replaced and a failed copy never leaves a partial
/// file at the key.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the file path an object key maps to.
    pub fn path_for(&self, key: &ObjectKey) -> PathBuf {
        key.as_str()
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

#[async_trait]
impl ArtifactStore for FsStore {
    async fn put_new(&self, key: &ObjectKey, file: &Path) -> Result<StoredObject, UploadError> {
        let target = self.path_for(key);
        let parent = target
            .parent()
            .ok_or_else(|| UploadError::invalid_target(self.root.display().to_string(), "no parent"))?;
        tokio::fs::create_dir_all(parent).await?;

        if tokio::fs::try_exists(&target).await? {
            return Err(UploadError::AlreadyExists {
                key: key.to_string(),
            });
        }

        // Removed when dropped, whichever way this call ends.
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}.", key.artifact()))
            .suffix(".partial")
            .tempfile_in(parent)?;
        let size_bytes = tokio::fs::copy(file, staging.path()).await?;

        let linked = tokio::fs::hard_link(staging.path(), &target).await;
        drop(staging);
        match linked {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(UploadError::AlreadyExists {
                    key: key.to_string(),
                });
            },
            Err(e) => return Err(e.into()),
        }

        info!("Stored {} bytes at {:?}", size_bytes, target);

        Ok(StoredObject {
            location: format!("file://{}", target.display()),
            size_bytes,
            version_id: None,
            etag: None,
        })
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, UploadError> {
        Ok(tokio::fs::try_exists(self.path_for(key)).await?)
    }

    fn name(&self) -> &str {
        "fs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ObjectKey {
        ObjectKey::parse("R/feature/x/abc123_2024-01-01-00-00-00.zip").unwrap()
    }

    #[tokio::test]
    async fn test_put_new_writes_nested_path() {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("src.zip");
        std::fs::write(&src, b"PK-data").unwrap();

        let store = FsStore::new(root.path().join("store"));
        let stored = store.put_new(&key(), &src).await.unwrap();

        let expected = root
            .path()
            .join("store/R/feature/x/abc123_2024-01-01-00-00-00.zip");
        assert_eq!(store.path_for(&key()), expected);
        assert_eq!(std::fs::read(&expected).unwrap(), b"PK-data");
        assert_eq!(stored.size_bytes, 7);
        assert!(store.exists(&key()).await.unwrap());
    }

    #[tokio::test]
    async fn test_put_new_never_overwrites() {
        let root = tempfile::tempdir().unwrap();
        let first = root.path().join("first.zip");
        let second = root.path().join("second.zip");
        std::fs::write(&first, b"first").unwrap();
        std::fs::write(&second, b"second").unwrap();

        let store = FsStore::new(root.path().join("store"));
        store.put_new(&key(), &first).await.unwrap();
        let err = store.put_new(&key(), &second).await.unwrap_err();

        assert!(matches!(err, UploadError::AlreadyExists { .. }));
        assert_eq!(std::fs::read(store.path_for(&key())).unwrap(), b"first");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_writers_one_wins() {
        let root = tempfile::tempdir().unwrap();
        let first = root.path().join("first.zip");
        let second = root.path().join("second.zip");
        std::fs::write(&first, vec![1u8; 256 * 1024]).unwrap();
        std::fs::write(&second, vec![2u8; 256 * 1024]).unwrap();

        let store = FsStore::new(root.path().join("store"));
        let key = key();
        let (a, b) = tokio::join!(store.put_new(&key, &first), store.put_new(&key, &second));

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(r, Err(UploadError::AlreadyExists { .. }))));

        let stored = std::fs::read(store.path_for(&key)).unwrap();
        assert_eq!(stored.len(), 256 * 1024);
        assert!(stored == vec![1u8; 256 * 1024] || stored == vec![2u8; 256 * 1024]);

        let parent = store.path_for(&key).parent().unwrap().to_path_buf();
        let leftovers = std::fs::read_dir(parent)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_missing_source_leaves_nothing() {
        let root = tempfile::tempdir().unwrap();
        let store = FsStore::new(root.path().join("store"));

        let result = store.put_new(&key(), &root.path().join("absent.zip")).await;

        assert!(result.is_err());
        assert!(!store.exists(&key()).await.unwrap());
    }
}
