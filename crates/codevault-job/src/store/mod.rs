//! Artifact stores.
//!
//! A store accepts finished archives and keeps them under their object
//! key. Stores never overwrite: putting a key that already exists fails
//! with [`UploadError::AlreadyExists`].

mod fs;
mod memory;
mod s3;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use codevault_core::ObjectKey;
use serde::Serialize;

use crate::error::UploadError;

pub use fs::FsStore;
pub use memory::MemoryStore;
pub use s3::{S3Store, ServerSideEncryption};

/// Where and how an artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    /// Full location, e.g. `s3://bucket/R/main/abc123_....zip`.
    pub location: String,
    pub size_bytes: u64,
    /// Version assigned by a versioned bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// A destination for backup artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Uploads `file` under `key`. Fails if the key is already taken.
    async fn put_new(&self, key: &ObjectKey, file: &Path) -> Result<StoredObject, UploadError>;

    /// Returns true if an object exists under `key`.
    async fn exists(&self, key: &ObjectKey) -> Result<bool, UploadError>;

    /// Returns the name of this store, for logs.
    fn name(&self) -> &str;
}

/// A parsed store location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// `s3://bucket[/prefix]`
    S3 { bucket: String, prefix: Option<String> },
    /// `file:///path`
    Local(PathBuf),
    /// `memory://`, keeps artifacts in process.
    Memory,
}

impl StoreTarget {
    /// Parses a target URL. A bare name is taken as an S3 bucket.
    ///
    /// ```
    /// use codevault_job::store::StoreTarget;
    ///
    /// assert_eq!(
    ///     StoreTarget::parse("my-backups").unwrap(),
    ///     StoreTarget::S3 { bucket: "my-backups".into(), prefix: None }
    /// );
    /// ```
    pub fn parse(raw: &str) -> Result<Self, UploadError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(UploadError::invalid_target(raw, "target is empty"));
        }

        if let Some(rest) = raw.strip_prefix("s3://") {
            let (bucket, prefix) = match rest.split_once('/') {
                Some((bucket, prefix)) => (bucket, prefix.trim_matches('/')),
                None => (rest, ""),
            };
            return Self::s3(raw, bucket, prefix);
        }
        if let Some(path) = raw.strip_prefix("file://") {
            if path.is_empty() {
                return Err(UploadError::invalid_target(raw, "missing path"));
            }
            return Ok(Self::Local(PathBuf::from(path)));
        }
        if raw == "memory://" {
            return Ok(Self::Memory);
        }
        if raw.contains("://") {
            return Err(UploadError::invalid_target(raw, "unsupported scheme"));
        }

        Self::s3(raw, raw, "")
    }

    fn s3(raw: &str, bucket: &str, prefix: &str) -> Result<Self, UploadError> {
        if bucket.is_empty() {
            return Err(UploadError::invalid_target(raw, "missing bucket name"));
        }
        if bucket.contains('/') || bucket.chars().any(char::is_whitespace) {
            return Err(UploadError::invalid_target(raw, "invalid bucket name"));
        }
        Ok(Self::S3 {
            bucket: bucket.to_string(),
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
        })
    }

    /// Opens the store this target names.
    ///
    /// S3 clients are configured from the default AWS provider chain.
    pub async fn open(
        &self,
        sse: Option<ServerSideEncryption>,
    ) -> Result<Arc<dyn ArtifactStore>, UploadError> {
        match self {
            Self::S3 { bucket, prefix } => {
                let store = S3Store::from_env(bucket.clone(), prefix.clone())
                    .await
                    .with_encryption(sse);
                Ok(Arc::new(store))
            },
            Self::Local(root) => Ok(Arc::new(FsStore::new(root.clone()))),
            Self::Memory => Ok(Arc::new(MemoryStore::new())),
        }
    }
}

impl fmt::Display for StoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S3 {
                bucket,
                prefix: Some(prefix),
            } => write!(f, "s3://{}/{}", bucket, prefix),
            Self::S3 { bucket, prefix: None } => write!(f, "s3://{}", bucket),
            Self::Local(root) => write!(f, "file://{}", root.display()),
            Self::Memory => f.write_str("memory://"),
        }
    }
}

/// Joins an optional prefix and a key with a single `/`.
pub(crate) fn prefixed(prefix: Option<&str>, key: &ObjectKey) -> String {
    match prefix {
        Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), key),
        None => key.to_string(),
    }
}
