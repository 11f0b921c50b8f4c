//! Codevault Job - clone, archive and upload one repository reference
//!
//! The job fetches the tree a [`BackupRequest`](codevault_core::BackupRequest)
//! points at, packages it into a zip archive and uploads it under its
//! object key. Each invocation is independent and writes exactly one new
//! object, or none when it fails.

pub mod archive;
pub mod clock;
pub mod error;
pub mod pipeline;
pub mod settings;
pub mod store;

pub use archive::{ArchiveBuilder, ArchiveSummary};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ArchiveError, JobError, UploadError};
pub use pipeline::{BackupJob, BackupOutcome};
pub use settings::{Settings, SettingsError};
pub use store::{ArtifactStore, FsStore, MemoryStore, S3Store, StoreTarget, StoredObject};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
