#![allow(dead_code)]
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use codevault_core::BackupRequest;
use codevault_git::{FetchError, FetchedTree, SourceFetcher};
use codevault_job::{BackupJob, FixedClock, MemoryStore};

/// Writes a small fixed tree, including a `.git` directory.
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SourceFetcher for FixtureFetcher {
    async fn fetch(
        &self,
        request: &BackupRequest,
        dest: &Path,
    ) -> Result<FetchedTree, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        std::fs::create_dir_all(dest.join(".git"))?;
        std::fs::create_dir_all(dest.join("src"))?;
        std::fs::write(dest.join(".git/HEAD"), "ref: refs/heads/main\n")?;
        std::fs::write(dest.join("README.md"), format!("# {}\n", request.repository_name()))?;
        std::fs::write(dest.join("src/lib.rs"), request.commit_id().as_str())?;

        Ok(FetchedTree {
            root: dest.to_path_buf(),
            head_commit: request.commit_id().to_string(),
            source_url: format!("fixture://{}", request.repository_name()),
        })
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

/// Writes part of a tree and then fails, like a clone cut off mid-transfer.
#[derive(Debug, Default)]
pub struct FailingFetcher;

#[async_trait]
impl SourceFetcher for FailingFetcher {
    async fn fetch(
        &self,
        _request: &BackupRequest,
        dest: &Path,
    ) -> Result<FetchedTree, FetchError> {
        std::fs::create_dir_all(dest)?;
        std::fs::write(dest.join("partial"), "half")?;
        Err(FetchError::unavailable("authentication denied"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub fn instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap()
}

pub fn request(repo: &str, branch: &str, commit: &str) -> BackupRequest {
    BackupRequest::new(repo, branch, "branch", commit, "us-east-1", "")
        .expect("Failed to create test request")
}

/// A job over a fixture fetcher and an in-memory store with a pinned clock.
pub fn memory_job(fetcher: Arc<dyn SourceFetcher>) -> (BackupJob, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let job = BackupJob::new(fetcher, store.clone()).with_clock(Arc::new(FixedClock(instant())));
    (job, store)
}
