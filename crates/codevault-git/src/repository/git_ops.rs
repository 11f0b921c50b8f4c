//! Git clone operations using gix (pure Rust).

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use gix::remote::fetch::Shallow;
use tracing::{debug, info, warn};

use super::GitRef;
use crate::error::FetchError;

/// How long a timed out clone may take to observe its interrupt flag.
const INTERRUPT_GRACE: Duration = Duration::from_secs(10);

/// A remote repository to be cloned into a local working tree.
///
/// Uses gix (pure Rust) for all Git operations - no system git required.
/// Credentials are resolved through the git credential helpers configured
/// in the environment.
pub struct GitRepository {
    url: String,
    local_path: PathBuf,
}

impl GitRepository {
    /// Creates a new GitRepository for `url`, to be cloned at `local_path`.
    pub fn new(url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            local_path: local_path.into(),
        }
    }

    /// Clones `git_ref` and checks out its working tree.
    ///
    /// Returns the commit id HEAD points at after checkout. The blocking
    /// gix work runs on the blocking pool and is interrupted if it exceeds
    /// `timeout`. After an interrupt the call waits up to
    /// a grace period for the clone to stop before reporting the
    /// timeout.
    pub async fn clone_at(
        &self,
        git_ref: &GitRef,
        depth: Option<NonZeroU32>,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        if self.local_path.exists() && std::fs::read_dir(&self.local_path)?.next().is_some() {
            return Err(FetchError::DestinationNotEmpty(self.local_path.clone()));
        }

        let url = self.url.clone();
        let local_path = self.local_path.clone();
        let git_ref_clone = git_ref.clone();
        let interrupt = Arc::new(AtomicBool::new(false));
        let interrupt_clone = Arc::clone(&interrupt);

        info!("Cloning {} at {} into {:?}", self.url, git_ref, self.local_path);

        let mut task = tokio::task::spawn_blocking(move || {
            Self::clone_blocking(&url, &local_path, &git_ref_clone, depth, &interrupt_clone)
        });

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(joined) => {
                let commit = joined
                    .map_err(|e| FetchError::git(format!("Clone task failed: {}", e)))??;
                info!("Clone complete at commit {}", &commit[..8.min(commit.len())]);
                Ok(commit)
            },
            Err(_) => {
                interrupt.store(true, Ordering::SeqCst);
                // gix stops at its next interrupt check; until then it may
                // still write below `local_path`.
                if tokio::time::timeout(INTERRUPT_GRACE, task).await.is_err() {
                    warn!(
                        "Clone of {} still running {}s after interrupt",
                        self.url,
                        INTERRUPT_GRACE.as_secs()
                    );
                }
                Err(FetchError::Timeout {
                    seconds: timeout.as_secs(),
                })
            },
        }
    }

    /// Blocking clone operation using gix.
    fn clone_blocking(
        uri: &str,
        local_path: &Path,
        git_ref: &GitRef,
        depth: Option<NonZeroU32>,
        interrupt: &AtomicBool,
    ) -> Result<String, FetchError> {
        // Create parent directories if needed
        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = gix::url::parse(uri.into())
            .map_err(|e| FetchError::invalid_url(uri, e.to_string()))?;

        let mut prepare = gix::prepare_clone(url, local_path)
            .map_err(|e| FetchError::git(format!("Failed to prepare clone: {}", e)))?;

        let full_ref = git_ref.full_ref();
        prepare = prepare
            .with_ref_name(Some(full_ref.as_str()))
            .map_err(|e| FetchError::ReferenceNotFound(format!("{}: {}", full_ref, e)))?;

        if let Some(depth) = depth {
            debug!("Using shallow clone with depth {}", depth);
            prepare = prepare.with_shallow(Shallow::DepthAtRemote(depth));
        }

        let (mut checkout, _outcome) = prepare
            .fetch_then_checkout(gix::progress::Discard, interrupt)
            .map_err(|e| match e {
                gix::clone::fetch::Error::RefNameMissing { .. } => {
                    FetchError::ReferenceNotFound(git_ref.to_string())
                },
                other => FetchError::unavailable(format!("Fetch from {} failed: {}", uri, other)),
            })?;

        let (repo, _outcome) = checkout
            .main_worktree(gix::progress::Discard, interrupt)
            .map_err(|e| FetchError::checkout(local_path, e.to_string()))?;

        let mut head = repo
            .head()
            .map_err(|e| FetchError::git(format!("Failed to get HEAD: {}", e)))?;

        let commit = head
            .peel_to_commit_in_place()
            .map_err(|e| FetchError::git(format!("Failed to peel HEAD: {}", e)))?;

        Ok(commit.id.to_string())
    }
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("url", &self.url)
            .field("local_path", &self.local_path)
            .finish()
    }
}
