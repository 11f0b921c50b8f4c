//! Error types for the packaging, upload and pipeline stages.

use std::path::PathBuf;

use codevault_core::BackupError;
use codevault_git::FetchError;

/// Errors raised while packaging a working tree.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The tree to package does not exist or is not a directory.
    #[error("source tree not found: {0}")]
    TreeNotFound(PathBuf),

    /// A path inside the tree is not valid UTF-8 and cannot be named in the archive.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    /// The zip writer failed.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while storing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// An object already exists at the key; artifacts are never overwritten.
    #[error("object already exists: {key}")]
    AlreadyExists { key: String },

    /// The store refused the request.
    #[error("permission denied for {key}: {reason}")]
    PermissionDenied { key: String, reason: String },

    /// The store could not be reached.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// The store target could not be understood.
    #[error("invalid store target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Creates a new unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new invalid target error.
    pub fn invalid_target(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if a later invocation might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Errors that terminate a backup invocation.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The request was rejected before any work started.
    #[error("invalid request: {0}")]
    Invalid(#[from] BackupError),

    /// The source could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The working tree could not be packaged.
    #[error("archive failed: {0}")]
    Archive(#[from] ArchiveError),

    /// The artifact could not be stored.
    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),

    /// The scratch directory could not be prepared.
    #[error("workspace error: {0}")]
    Workspace(#[source] std::io::Error),

    /// A blocking task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),
}

impl JobError {
    /// Returns the pipeline stage the error came from.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "validate",
            Self::Fetch(_) => "fetch",
            Self::Archive(_) => "archive",
            Self::Upload(_) => "upload",
            Self::Workspace(_) | Self::Task(_) => "workspace",
        }
    }

    /// Returns true if a later invocation might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_transient(),
            Self::Upload(e) => e.is_transient(),
            _ => false,
        }
    }
}
