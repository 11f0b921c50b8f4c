//! Codevault Core - Domain types for repository backups
//!
//! This crate holds the pieces every other Codevault crate agrees on:
//! what a trigger event looks like, which events start a backup, how a
//! backup request is validated, and how artifacts are named and keyed.

pub mod artifact;
pub mod error;
pub mod event;
pub mod filter;
pub mod request;
pub mod retention;
pub mod types;

pub use artifact::{ARCHIVE_EXTENSION, ArtifactName, ObjectKey, TIMESTAMP_FORMAT};
pub use error::{BackupError, Result};
pub use event::{BackupEvent, ReferenceEvent, ReferenceType};
pub use filter::{Decision, SkipReason, TriggerFilter};
pub use request::{BackupRequest, inputs};
pub use retention::RetentionPolicy;
pub use types::{CommitId, ReferenceName, RepositoryName};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
