//! Error types for fetching a repository.

use std::path::PathBuf;

/// Errors that can occur while fetching a source repository.
///
/// Every variant is fatal to the invocation; nothing is uploaded after a
/// fetch failure.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The clone URL could not be built or parsed.
    #[error("invalid source URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The requested branch or tag does not exist on the remote.
    #[error("reference not found: {0}")]
    ReferenceNotFound(String),

    /// The remote could not be reached or refused the credentials.
    #[error("source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    /// The working tree could not be written.
    #[error("checkout failed in {path}: {reason}")]
    Checkout { path: PathBuf, reason: String },

    /// The destination directory already holds files.
    #[error("destination is not empty: {0}")]
    DestinationNotEmpty(PathBuf),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A Git operation failed.
    #[error("git error: {0}")]
    Git(String),

    /// The fetch did not finish in time.
    #[error("fetch timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl FetchError {
    /// Creates a new Git error.
    pub fn git(msg: impl Into<String>) -> Self {
        Self::Git(msg.into())
    }

    /// Creates a new source unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new checkout error.
    pub fn checkout(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Checkout {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a transient error that might succeed on a
    /// later invocation.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. } | Self::Timeout { .. })
    }
}
