//! Git reference types.

use std::fmt;

use codevault_core::{BackupRequest, ReferenceType};

use crate::error::FetchError;

/// The reference a backup clones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GitRef {
    /// A branch reference (e.g., "main", "feature/login").
    Branch(String),

    /// A tag reference (e.g., "v1.0.0").
    Tag(String),
}

impl GitRef {
    /// Creates a branch reference.
    pub fn branch(name: impl Into<String>) -> Self {
        Self::Branch(name.into())
    }

    /// Creates a tag reference.
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    /// Picks the reference a request points at.
    ///
    /// Only branches and tags can be cloned by name; any other reference
    /// type is rejected.
    pub fn for_request(request: &BackupRequest) -> Result<Self, FetchError> {
        let name = request.reference_name().as_str();
        match request.reference_type() {
            ReferenceType::Branch => Ok(Self::branch(name)),
            ReferenceType::Tag => Ok(Self::tag(name)),
            ReferenceType::Other(kind) => Err(FetchError::ReferenceNotFound(format!(
                "{} (unsupported reference type '{}')",
                name, kind
            ))),
        }
    }

    /// Returns the full Git reference path.
    pub fn full_ref(&self) -> String {
        match self {
            Self::Branch(name) => format!("refs/heads/{}", name),
            Self::Tag(name) => format!("refs/tags/{}", name),
        }
    }
}

impl fmt::Display for GitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(name) => write!(f, "{}", name),
            Self::Tag(name) => write!(f, "tags/{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(ref_type: &str, name: &str) -> BackupRequest {
        BackupRequest::new("repo", name, ref_type, "abc123", "us-east-1", "").unwrap()
    }

    #[test]
    fn test_for_request() {
        assert_eq!(
            GitRef::for_request(&request("branch", "feature/test")).unwrap(),
            GitRef::branch("feature/test")
        );
        assert_eq!(
            GitRef::for_request(&request("tag", "v2.0.0")).unwrap(),
            GitRef::tag("v2.0.0")
        );
        assert!(GitRef::for_request(&request("note", "x")).is_err());
    }

    #[test]
    fn test_full_ref() {
        assert_eq!(GitRef::branch("main").full_ref(), "refs/heads/main");
        assert_eq!(GitRef::tag("v1.0.0").full_ref(), "refs/tags/v1.0.0");
    }

    #[test]
    fn test_display() {
        assert_eq!(GitRef::branch("main").to_string(), "main");
        assert_eq!(GitRef::tag("v1.0.0").to_string(), "tags/v1.0.0");
    }
}
