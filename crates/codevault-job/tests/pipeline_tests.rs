mod common;

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use codevault_core::{ObjectKey, RetentionPolicy};
use codevault_job::{
    ArtifactStore, BackupJob, FixedClock, FsStore, JobError, MemoryStore, UploadError,
};
use common::{FailingFetcher, FixtureFetcher, instant, memory_job, request};

#[tokio::test(flavor = "multi_thread")]
async fn test_successful_run_writes_one_object_at_expected_key() {
    let (job, store) = memory_job(Arc::new(FixtureFetcher::default()));

    let outcome = job.run(&request("R", "main", "abc123")).await.unwrap();

    assert_eq!(outcome.key.as_str(), "R/main/abc123_2025-06-01-08-30-00.zip");
    assert_eq!(store.keys(), vec![outcome.key.to_string()]);
    assert_eq!(outcome.head_commit, "abc123");
    assert_eq!(outcome.archive.files, 3);
    assert_eq!(outcome.stored.size_bytes, outcome.archive.archive_bytes);
    assert_eq!(outcome.retention, RetentionPolicy::Forever);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_archive_contains_whole_tree() {
    let (job, store) = memory_job(Arc::new(FixtureFetcher::default()));
    let outcome = job.run(&request("R", "main", "abc123")).await.unwrap();

    let bytes = store.get(outcome.key.as_str()).unwrap();
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();

    let mut head = String::new();
    zip.by_name(".git/HEAD")
        .unwrap()
        .read_to_string(&mut head)
        .unwrap();
    assert_eq!(head, "ref: refs/heads/main\n");
    assert!(zip.by_name("src/lib.rs").is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_failure_uploads_nothing() {
    let (job, store) = memory_job(Arc::new(FailingFetcher));

    let err = job.run(&request("R", "main", "abc123")).await.unwrap_err();

    assert!(matches!(err, JobError::Fetch(_)));
    assert_eq!(err.stage(), "fetch");
    assert!(store.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_failure_is_fatal() {
    let job = BackupJob::new(
        Arc::new(FixtureFetcher::default()),
        Arc::new(MemoryStore::unavailable()),
    );

    let err = job.run(&request("R", "main", "abc123")).await.unwrap_err();

    assert!(matches!(err, JobError::Upload(UploadError::Unavailable { .. })));
    assert!(err.is_transient());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_runs_for_distinct_commits() {
    let (job, store) = memory_job(Arc::new(FixtureFetcher::default()));
    let job = Arc::new(job);

    let first = {
        let job = Arc::clone(&job);
        tokio::spawn(async move { job.run(&request("R", "main", "abc123")).await })
    };
    let second = {
        let job = Arc::clone(&job);
        tokio::spawn(async move { job.run(&request("R", "main", "def456")).await })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_ne!(first.key, second.key);
    assert_eq!(store.len(), 2);
    assert!(store.exists(&first.key).await.unwrap());
    assert!(store.exists(&second.key).await.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_same_commit_later_instant_is_kept_separately() {
    let fetcher = Arc::new(FixtureFetcher::default());
    let store = Arc::new(MemoryStore::new());

    let early = BackupJob::new(fetcher.clone(), store.clone())
        .with_clock(Arc::new(FixedClock(instant())));
    let late = BackupJob::new(fetcher.clone(), store.clone())
        .with_clock(Arc::new(FixedClock(instant() + chrono::Duration::seconds(1))));

    let a = early.run(&request("R", "main", "abc123")).await.unwrap();
    let b = late.run(&request("R", "main", "abc123")).await.unwrap();

    assert_ne!(a.key, b.key);
    assert_eq!(store.len(), 2);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repeat_at_same_instant_does_not_overwrite() {
    let (job, store) = memory_job(Arc::new(FixtureFetcher::default()));

    let first = job.run(&request("R", "main", "abc123")).await.unwrap();
    let original = store.get(first.key.as_str()).unwrap();

    let err = job.run(&request("R", "main", "abc123")).await.unwrap_err();

    assert!(matches!(err, JobError::Upload(UploadError::AlreadyExists { .. })));
    assert_eq!(store.get(first.key.as_str()).unwrap(), original);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_filesystem_store_and_scratch_cleanup() {
    let root = tempfile::tempdir().unwrap();
    let work = root.path().join("work");
    let store = Arc::new(FsStore::new(root.path().join("store")));

    let job = BackupJob::new(Arc::new(FixtureFetcher::default()), store.clone())
        .with_clock(Arc::new(FixedClock(instant())))
        .with_retention(RetentionPolicy::from_days(30))
        .with_work_root(Some(work.clone()));

    let outcome = job.run(&request("R", "feature/x", "abc123")).await.unwrap();

    let key = ObjectKey::parse("R/feature/x/abc123_2025-06-01-08-30-00.zip").unwrap();
    assert_eq!(outcome.key, key);
    assert!(store.path_for(&key).is_file());
    assert_eq!(outcome.retention.expiration_days(), Some(30));
    assert_eq!(std::fs::read_dir(&work).unwrap().count(), 0);
}
