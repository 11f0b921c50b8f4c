//! The clone, archive, upload pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use codevault_core::{BackupRequest, ObjectKey, RetentionPolicy};
use codevault_git::SourceFetcher;
use serde::Serialize;
use tracing::{Instrument, info, info_span};

use crate::archive::{ArchiveBuilder, ArchiveSummary};
use crate::clock::{Clock, SystemClock};
use crate::error::JobError;
use crate::store::{ArtifactStore, StoredObject};

/// Result of one successful invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupOutcome {
    pub key: ObjectKey,
    pub stored: StoredObject,
    /// Commit the fetched branch pointed at; may be newer than the request.
    pub head_commit: String,
    pub source_url: String,
    pub archive: ArchiveSummary,
    pub retention: RetentionPolicy,
    pub elapsed_ms: u64,
}

/// Runs one backup per request.
///
/// Each run works in its own scratch directory, which is removed when the
/// run ends. Nothing is uploaded unless fetching and packaging both
/// succeeded, and exactly one new object is written on success.
pub struct BackupJob {
    fetcher: Arc<dyn SourceFetcher>,
    store: Arc<dyn ArtifactStore>,
    clock: Arc<dyn Clock>,
    retention: RetentionPolicy,
    work_root: Option<PathBuf>,
}

impl BackupJob {
    /// Creates a job using the system clock and keep-forever retention.
    pub fn new(fetcher: Arc<dyn SourceFetcher>, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            fetcher,
            store,
            clock: Arc::new(SystemClock),
            retention: RetentionPolicy::default(),
            work_root: None,
        }
    }

    /// Replaces the clock used to stamp artifact names.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the retention reported with each outcome.
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Creates scratch directories under `root` instead of the system temp dir.
    pub fn with_work_root(mut self, root: Option<PathBuf>) -> Self {
        self.work_root = root;
        self
    }

    /// Fetches, packages and uploads the tree `request` points at.
    pub async fn run(&self, request: &BackupRequest) -> Result<BackupOutcome, JobError> {
        let span = info_span!(
            "backup",
            repository = %request.repository_name(),
            reference = %request.reference_name(),
            commit = %request.commit_id().short(),
        );
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: &BackupRequest) -> Result<BackupOutcome, JobError> {
        let started = Instant::now();

        let workspace = match &self.work_root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(JobError::Workspace)?;
                tempfile::Builder::new()
                    .prefix("codevault-")
                    .tempdir_in(root)
            },
            None => tempfile::Builder::new().prefix("codevault-").tempdir(),
        }
        .map_err(JobError::Workspace)?;

        info!("Fetching {} with {}", request, self.fetcher.name());
        let tree = self
            .fetcher
            .fetch(request, &workspace.path().join("tree"))
            .await?;

        let key = ObjectKey::for_request(request, self.clock.now());
        let archive_path = workspace.path().join(key.artifact().to_string());

        info!("Packaging {:?} as {}", tree.root, key.artifact());
        let builder = ArchiveBuilder::new(tree.root.clone());
        let archive_dest = archive_path.clone();
        let archive = tokio::task::spawn_blocking(move || builder.build(&archive_dest))
            .await
            .map_err(|e| JobError::Task(format!("archive task failed: {}", e)))??;

        info!("Uploading {} to {}", key, self.store.name());
        let stored = self.store.put_new(&key, &archive_path).await?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            "Backup stored at {} ({} bytes, {} ms, retention {})",
            stored.location, stored.size_bytes, elapsed_ms, self.retention
        );

        Ok(BackupOutcome {
            key,
            stored,
            head_commit: tree.head_commit,
            source_url: tree.source_url,
            archive,
            retention: self.retention,
            elapsed_ms,
        })
    }
}

impl std::fmt::Debug for BackupJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupJob")
            .field("fetcher", &self.fetcher.name())
            .field("store", &self.store.name())
            .field("retention", &self.retention)
            .field("work_root", &self.work_root)
            .finish()
    }
}
