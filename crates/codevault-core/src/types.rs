//! Validated identifiers used to build backup requests and object keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BackupError, Result};

/// Name of a source repository.
///
/// Becomes the first segment of every object key, so it may not contain `/`.
///
/// # Example
///
/// ```
/// use codevault_core::RepositoryName;
///
/// let repo = RepositoryName::parse("payments-service").unwrap();
/// assert_eq!(repo.as_str(), "payments-service");
/// assert!(RepositoryName::parse("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Validates and wraps a repository name.
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(BackupError::invalid_field("repositoryName", "cannot be empty"));
        }
        if trimmed.contains('/') {
            return Err(BackupError::invalid_field(
                "repositoryName",
                format!("'{}' cannot contain '/'", trimmed),
            ));
        }
        if trimmed.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(BackupError::invalid_field(
                "repositoryName",
                format!("'{}' contains whitespace or control characters", trimmed),
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the repository name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short branch or tag name, without the `refs/heads/` prefix.
///
/// Validated with the same rules git applies to ref names, since the value
/// is both passed to the clone and used as an object key prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceName(String);

impl ReferenceName {
    /// Validates and wraps a reference name. A `refs/heads/` prefix is stripped.
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let name = name.trim();
        let name = name.strip_prefix("refs/heads/").unwrap_or(name);

        let reject = |reason: &str| Err(BackupError::invalid_field("referenceName", reason));

        if name.is_empty() {
            return reject("cannot be empty");
        }
        if name.starts_with('/') || name.ends_with('/') {
            return reject("cannot start or end with '/'");
        }
        if name.contains("..") {
            return reject("cannot contain '..'");
        }
        if name.contains("//") {
            return reject("cannot contain '//'");
        }
        if name.ends_with(".lock") || name.ends_with('.') {
            return reject("cannot end with '.lock' or '.'");
        }
        if name.contains("@{") {
            return reject("cannot contain '@{'");
        }
        if name.chars().any(|c| {
            c.is_control() || matches!(c, ' ' | '~' | '^' | ':' | '?' | '*' | '[' | '\\')
        }) {
            return reject("contains invalid characters");
        }

        Ok(Self(name.to_string()))
    }

    /// Returns the reference name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hex commit id, stored lowercase.
///
/// Full SHA-1 (40) and SHA-256 (64) ids are accepted, as are abbreviations
/// down to 4 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Validates and wraps a commit id.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let id = id.trim();

        if !(4..=64).contains(&id.len()) {
            return Err(BackupError::invalid_field(
                "commitId",
                format!("'{}' must be 4 to 64 hex characters", id),
            ));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BackupError::invalid_field(
                "commitId",
                format!("'{}' is not hexadecimal", id),
            ));
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Returns the commit id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first eight characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }

    /// Returns true if `other` names the same commit, allowing either side
    /// to be an abbreviation of the other.
    pub fn matches(&self, other: &str) -> bool {
        let other = other.to_ascii_lowercase();
        self.0.starts_with(&other) || other.starts_with(&self.0)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
