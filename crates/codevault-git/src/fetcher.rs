//! Source fetcher trait and its Git implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use codevault_core::BackupRequest;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::repository::{FetchConfig, GitRef, GitRepository};

/// A working tree fetched for one backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTree {
    /// Directory holding the checked out tree.
    pub root: PathBuf,
    /// Commit HEAD points at after checkout.
    pub head_commit: String,
    /// URL the tree was fetched from.
    pub source_url: String,
}

/// A source of repository working trees.
///
/// The backup pipeline only depends on this trait, so tests can substitute
/// a fetcher that writes a fixture tree or fails on demand.
///
/// # Example
///
/// ```ignore
/// use codevault_git::{FetchError, FetchedTree, SourceFetcher};
///
/// struct Fixture;
///
/// #[async_trait]
/// impl SourceFetcher for Fixture {
///     async fn fetch(&self, request: &BackupRequest, dest: &Path) -> Result<FetchedTree, FetchError> {
///         std::fs::write(dest.join("README.md"), "fixture")?;
///         // ...
///     }
///
///     fn name(&self) -> &str {
///         "fixture"
///     }
/// }
/// ```
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetches the tree `request` points at into `dest`.
    ///
    /// `dest` must be empty or absent. On error the contents of `dest` are
    /// unspecified and must not be archived.
    async fn fetch(&self, request: &BackupRequest, dest: &Path)
    -> Result<FetchedTree, FetchError>;

    /// Returns the name of this fetcher, for logs.
    fn name(&self) -> &str;
}

/// Fetches repositories by cloning them with gix.
#[derive(Debug, Clone, Default)]
pub struct GitFetcher {
    config: FetchConfig,
}

impl GitFetcher {
    /// Creates a new Git fetcher.
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SourceFetcher for GitFetcher {
    async fn fetch(
        &self,
        request: &BackupRequest,
        dest: &Path,
    ) -> Result<FetchedTree, FetchError> {
        let git_ref = GitRef::for_request(request)?;
        let source_url = self
            .config
            .source_url(request.repository_name().as_str(), request.region());

        debug!("Fetching {} from {}", request, source_url);

        let repository = GitRepository::new(&source_url, dest);
        let head_commit = repository
            .clone_at(
                &git_ref,
                self.config.shallow_depth(),
                self.config.fetch_timeout(),
            )
            .await?;

        if !request.commit_id().matches(&head_commit) {
            warn!(
                "{} moved since the trigger: requested {}, fetched {}",
                git_ref,
                request.commit_id().short(),
                &head_commit[..8.min(head_commit.len())]
            );
        }

        Ok(FetchedTree {
            root: dest.to_path_buf(),
            head_commit,
            source_url,
        })
    }

    fn name(&self) -> &str {
        "git"
    }
}
