//! Naming of backup artifacts and the keys they are stored under.
//!
//! An artifact is named `{commitId}_{timestamp}.zip` and stored at
//! `{repositoryName}/{referenceName}/{artifactName}`. The timestamp uses
//! `YYYY-MM-DD-HH-MM-SS` in UTC so names of one commit sort by creation
//! time, and two backups of the same commit taken at different instants
//! never share a key.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{BackupError, Result};
use crate::request::BackupRequest;
use crate::types::{CommitId, ReferenceName, RepositoryName};

/// Timestamp layout embedded in artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// File extension of every artifact.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// File name of one backup archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName {
    commit_id: CommitId,
    created_at: NaiveDateTime,
}

impl ArtifactName {
    /// Names an artifact for `commit_id` generated at `created_at`.
    ///
    /// Sub-second precision is dropped; it is not part of the name.
    pub fn new(commit_id: CommitId, created_at: DateTime<Utc>) -> Self {
        let created_at = created_at.naive_utc();
        let created_at = created_at.with_nanosecond(0).unwrap_or(created_at);
        Self {
            commit_id,
            created_at,
        }
    }

    /// Recovers an artifact name from its string form.
    ///
    /// # Example
    ///
    /// ```
    /// use codevault_core::ArtifactName;
    ///
    /// let name = ArtifactName::parse("abc123_2024-03-01-12-30-05.zip").unwrap();
    /// assert_eq!(name.commit_id().as_str(), "abc123");
    /// assert_eq!(name.timestamp(), "2024-03-01-12-30-05");
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let malformed = || BackupError::MalformedArtifactName(raw.to_string());

        let stem = raw
            .strip_suffix(ARCHIVE_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(malformed)?;
        let (commit, timestamp) = stem.split_once('_').ok_or_else(malformed)?;

        let commit_id = CommitId::parse(commit).map_err(|_| malformed())?;
        let created_at =
            NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|_| malformed())?;

        Ok(Self {
            commit_id,
            created_at,
        })
    }

    pub fn commit_id(&self) -> &CommitId {
        &self.commit_id
    }

    /// Returns the generation instant.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }

    /// Returns the formatted timestamp part of the name.
    pub fn timestamp(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}.{}",
            self.commit_id,
            self.timestamp(),
            ARCHIVE_EXTENSION
        )
    }
}

impl Serialize for ArtifactName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Location of an artifact inside the target store.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use codevault_core::{BackupRequest, ObjectKey};
///
/// let request = BackupRequest::new("R", "main", "branch", "abc123", "us-east-1", "").unwrap();
/// let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
/// let key = ObjectKey::for_request(&request, at);
/// assert_eq!(key.as_str(), "R/main/abc123_2024-01-02-03-04-05.zip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    repository_name: RepositoryName,
    reference_name: ReferenceName,
    artifact: ArtifactName,
    rendered: String,
}

impl ObjectKey {
    /// Builds the key from its parts.
    pub fn new(
        repository_name: RepositoryName,
        reference_name: ReferenceName,
        artifact: ArtifactName,
    ) -> Self {
        let rendered = format!("{}/{}/{}", repository_name, reference_name, artifact);
        Self {
            repository_name,
            reference_name,
            artifact,
            rendered,
        }
    }

    /// Builds the key for a request's artifact generated at `created_at`.
    pub fn for_request(request: &BackupRequest, created_at: DateTime<Utc>) -> Self {
        Self::new(
            request.repository_name().clone(),
            request.reference_name().clone(),
            ArtifactName::new(request.commit_id().clone(), created_at),
        )
    }

    /// Parses a rendered key. The reference name may itself contain `/`.
    pub fn parse(raw: &str) -> Result<Self> {
        let malformed = || BackupError::MalformedArtifactName(raw.to_string());

        let (repository, rest) = raw.split_once('/').ok_or_else(malformed)?;
        let (reference, artifact) = rest.rsplit_once('/').ok_or_else(malformed)?;

        Ok(Self::new(
            RepositoryName::parse(repository)?,
            ReferenceName::parse(reference)?,
            ArtifactName::parse(artifact)?,
        ))
    }

    pub fn repository_name(&self) -> &RepositoryName {
        &self.repository_name
    }

    pub fn reference_name(&self) -> &ReferenceName {
        &self.reference_name
    }

    pub fn artifact(&self) -> &ArtifactName {
        &self.artifact
    }

    /// Returns the `{repository}/{reference}/` prefix shared by all
    /// artifacts of one reference.
    pub fn prefix(&self) -> String {
        format!("{}/{}/", self.repository_name, self.reference_name)
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl Serialize for ObjectKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.rendered)
    }
}
