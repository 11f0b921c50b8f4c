//! Amazon S3 artifact store.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use codevault_core::ObjectKey;
use tracing::{debug, info};

use super::{ArtifactStore, StoredObject, prefixed};
use crate::error::UploadError;

/// Server-side encryption applied to uploaded artifacts.
pub use aws_sdk_s3::types::ServerSideEncryption;

const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Stores artifacts in an S3 bucket.
///
/// Uploads are conditional on the key being absent (`If-None-Match: *`),
/// so an existing object is never replaced.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: Option<String>,
    sse: Option<ServerSideEncryption>,
}

impl S3Store {
    /// Creates a store around an existing client.
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: None,
            sse: None,
        }
    }

    /// Creates a store with a client configured from the environment.
    pub async fn from_env(bucket: impl Into<String>, prefix: Option<String>) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_s3::Client::new(&aws_config), bucket).with_prefix(prefix)
    }

    /// Places every key under `prefix`.
    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    /// Requests server-side encryption for uploads.
    pub fn with_encryption(mut self, sse: Option<ServerSideEncryption>) -> Self {
        self.sse = sse;
        self
    }

    fn object_key(&self, key: &ObjectKey) -> String {
        prefixed(self.prefix.as_deref(), key)
    }
}

/// Maps an SDK failure onto the upload error kinds.
fn classify<E>(key: &str, err: SdkError<E, HttpResponse>) -> UploadError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let status = err
        .raw_response()
        .map(|response| response.status().as_u16());
    let reason = DisplayErrorContext(&err).to_string();
    debug!("S3 request for {} failed with status {:?}", key, status);

    match status {
        Some(409) | Some(412) => UploadError::AlreadyExists {
            key: key.to_string(),
        },
        Some(401) | Some(403) => UploadError::PermissionDenied {
            key: key.to_string(),
            reason,
        },
        _ => UploadError::unavailable(reason),
    }
}

/// Interprets a failed existence check; a missing object is not an error.
fn absent_or_error(
    key: &str,
    err: SdkError<HeadObjectError, HttpResponse>,
) -> Result<bool, UploadError> {
    match err {
        SdkError::ServiceError(service) if service.err().is_not_found() => Ok(false),
        other => Err(classify(key, other)),
    }
}

#[async_trait]
impl ArtifactStore for S3Store {
    async fn put_new(&self, key: &ObjectKey, file: &Path) -> Result<StoredObject, UploadError> {
        let object_key = self.object_key(key);
        let size_bytes = tokio::fs::metadata(file).await?.len();
        let body = ByteStream::from_path(file)
            .await
            .map_err(|e| UploadError::Io(std::io::Error::other(e)))?;

        info!(
            "Uploading {} bytes to s3://{}/{}",
            size_bytes, self.bucket, object_key
        );

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type(ARCHIVE_CONTENT_TYPE)
            .if_none_match("*")
            .body(body);
        if let Some(sse) = &self.sse {
            request = request.server_side_encryption(sse.clone());
        }

        let output = request
            .send()
            .await
            .map_err(|e| classify(&object_key, e))?;

        Ok(StoredObject {
            location: format!("s3://{}/{}", self.bucket, object_key),
            size_bytes,
            version_id: output.version_id().map(str::to_string),
            etag: output.e_tag().map(str::to_string),
        })
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, UploadError> {
        let object_key = self.object_key(key);
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => absent_or_error(&object_key, e),
        }
    }

    fn name(&self) -> &str {
        "s3"
    }
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("sse", &self.sse)
            .finish()
    }
}
