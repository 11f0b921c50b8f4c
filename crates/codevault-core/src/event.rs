//! Trigger events emitted by the version-control host.
//!
//! The host publishes one event per reference change. Only branch
//! creations and updates start a backup; everything else is decoded so the
//! skip can be logged with a reason.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BackupError, Result};

/// Kind of reference the event is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceType {
    /// A branch under `refs/heads/`.
    Branch,
    /// A tag under `refs/tags/`.
    Tag,
    /// Anything the host may add later.
    Other(String),
}

impl ReferenceType {
    /// Parses the host's lowercase reference type.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "branch" => Self::Branch,
            "tag" => Self::Tag,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Branch => "branch",
            Self::Tag => "tag",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReferenceType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// What happened to the reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceEvent {
    Created,
    Updated,
    Deleted,
    Other(String),
}

impl ReferenceEvent {
    /// Parses the host's camelCase event name.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "referenceCreated" => Self::Created,
            "referenceUpdated" => Self::Updated,
            "referenceDeleted" => Self::Deleted,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "referenceCreated",
            Self::Updated => "referenceUpdated",
            Self::Deleted => "referenceDeleted",
            Self::Other(raw) => raw,
        }
    }

    /// Returns true for events that leave a reference pointing at a commit.
    pub fn produces_snapshot(&self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

impl fmt::Display for ReferenceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReferenceEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Raw envelope as delivered by the event bus.
#[derive(Debug, Deserialize)]
struct Envelope {
    account: Option<String>,
    region: Option<String>,
    detail: Option<Detail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Detail {
    event: Option<String>,
    repository_name: Option<String>,
    reference_name: Option<String>,
    reference_type: Option<String>,
    commit_id: Option<String>,
}

/// A decoded reference-change notification.
///
/// Fields are carried as the host sent them; validation happens when the
/// event is turned into a [`crate::BackupRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEvent {
    pub event: ReferenceEvent,
    pub repository_name: String,
    pub reference_name: String,
    pub reference_type: ReferenceType,
    /// Empty for deletions, which carry no target commit.
    pub commit_id: String,
    pub region: String,
    pub account_id: String,
}

impl BackupEvent {
    /// Decodes an event from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| BackupError::event_parse_with_cause("invalid JSON", e))?;
        Self::from_value(value)
    }

    /// Decodes an event from an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let envelope: Envelope = serde_json::from_value(value)
            .map_err(|e| BackupError::event_parse_with_cause("unexpected event shape", e))?;

        let detail = envelope
            .detail
            .ok_or_else(|| BackupError::event_parse("missing 'detail' object"))?;

        let required = |value: Option<String>, name: &str| -> Result<String> {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| BackupError::missing_input(name))
        };

        Ok(Self {
            event: ReferenceEvent::parse(&required(detail.event, "detail.event")?),
            repository_name: required(detail.repository_name, "detail.repositoryName")?,
            reference_name: required(detail.reference_name, "detail.referenceName")?,
            reference_type: ReferenceType::parse(&required(
                detail.reference_type,
                "detail.referenceType",
            )?),
            commit_id: detail.commit_id.unwrap_or_default(),
            region: required(envelope.region, "region")?,
            account_id: envelope.account.unwrap_or_default(),
        })
    }

    /// Returns true if the event is a branch creation or update.
    pub fn qualifies(&self) -> bool {
        self.reference_type == ReferenceType::Branch && self.event.produces_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPDATED: &str = r#"{
        "version": "0",
        "detail-type": "CodeCommit Repository State Change",
        "source": "aws.codecommit",
        "account": "123456789012",
        "region": "eu-west-1",
        "detail": {
            "event": "referenceUpdated",
            "repositoryName": "payments",
            "referenceType": "branch",
            "referenceName": "main",
            "commitId": "abc123def4567890abc123def4567890abc123de",
            "oldCommitId": "0000000000000000000000000000000000000000"
        }
    }"#;

    #[test]
    fn test_parse_branch_update() {
        let event = BackupEvent::from_json(UPDATED).unwrap();

        assert_eq!(event.event, ReferenceEvent::Updated);
        assert_eq!(event.repository_name, "payments");
        assert_eq!(event.reference_name, "main");
        assert_eq!(event.reference_type, ReferenceType::Branch);
        assert_eq!(event.region, "eu-west-1");
        assert_eq!(event.account_id, "123456789012");
        assert!(event.qualifies());
    }

    #[test]
    fn test_tag_does_not_qualify() {
        let json = UPDATED.replace(r#""referenceType": "branch""#, r#""referenceType": "tag""#);
        let event = BackupEvent::from_json(&json).unwrap();

        assert_eq!(event.reference_type, ReferenceType::Tag);
        assert!(!event.qualifies());
    }

    #[test]
    fn test_deletion_does_not_qualify() {
        let json = UPDATED.replace("referenceUpdated", "referenceDeleted");
        let event = BackupEvent::from_json(&json).unwrap();

        assert!(!event.qualifies());
    }

    #[test]
    fn test_missing_detail() {
        let err = BackupEvent::from_json(r#"{"region": "us-east-1"}"#).unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_missing_repository_name() {
        let json = UPDATED.replace(r#""repositoryName": "payments","#, "");
        let err = BackupEvent::from_json(&json).unwrap_err();

        assert!(err.to_string().contains("detail.repositoryName"));
    }

    #[test]
    fn test_unknown_values_are_kept() {
        assert_eq!(
            ReferenceType::parse("note"),
            ReferenceType::Other("note".to_string())
        );
        assert_eq!(ReferenceEvent::parse("referenceMoved").as_str(), "referenceMoved");
    }
}
