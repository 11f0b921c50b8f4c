//! The validated input of one backup job invocation.

use serde::Serialize;
use std::fmt;

use crate::error::{BackupError, Result};
use crate::event::{BackupEvent, ReferenceType};
use crate::types::{CommitId, ReferenceName, RepositoryName};

/// Environment variable names the job reads its inputs from.
pub mod inputs {
    pub const REFERENCE_NAME: &str = "REFERENCE_NAME";
    pub const REFERENCE_TYPE: &str = "REFERENCE_TYPE";
    pub const REPOSITORY_NAME: &str = "REPOSITORY_NAME";
    pub const COMMIT_ID: &str = "COMMIT_ID";
    pub const REPO_REGION: &str = "REPO_REGION";
    pub const ACCOUNT_ID: &str = "ACCOUNT_ID";
    pub const BACKUP_BUCKET_NAME: &str = "BACKUP_BUCKET_NAME";
}

/// Everything one backup invocation needs to know about its source.
///
/// # Example
///
/// ```
/// use codevault_core::BackupRequest;
///
/// let request = BackupRequest::new("payments", "main", "branch", "abc123", "eu-west-1", "")
///     .unwrap();
/// assert_eq!(request.repository_name().as_str(), "payments");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRequest {
    repository_name: RepositoryName,
    reference_name: ReferenceName,
    reference_type: ReferenceType,
    commit_id: CommitId,
    region: String,
    account_id: Option<String>,
}

impl BackupRequest {
    /// Validates raw inputs into a request.
    ///
    /// An empty `reference_type` defaults to `branch`; an empty `account_id`
    /// is treated as absent.
    pub fn new(
        repository_name: impl Into<String>,
        reference_name: impl Into<String>,
        reference_type: impl Into<String>,
        commit_id: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Result<Self> {
        let reference_type = reference_type.into();
        let reference_type = if reference_type.trim().is_empty() {
            ReferenceType::Branch
        } else {
            ReferenceType::parse(&reference_type)
        };

        let region = region.into().trim().to_string();
        if region.is_empty() {
            return Err(BackupError::missing_input(inputs::REPO_REGION));
        }

        let account_id = account_id.into().trim().to_string();

        Ok(Self {
            repository_name: RepositoryName::parse(repository_name)?,
            reference_name: ReferenceName::parse(reference_name)?,
            reference_type,
            commit_id: CommitId::parse(commit_id)?,
            region,
            account_id: (!account_id.is_empty()).then_some(account_id),
        })
    }

    /// Builds a request from a trigger event.
    pub fn from_event(event: &BackupEvent) -> Result<Self> {
        if event.commit_id.trim().is_empty() {
            return Err(BackupError::missing_input("detail.commitId"));
        }

        Self::new(
            event.repository_name.clone(),
            event.reference_name.clone(),
            event.reference_type.as_str(),
            event.commit_id.clone(),
            event.region.clone(),
            event.account_id.clone(),
        )
    }

    pub fn repository_name(&self) -> &RepositoryName {
        &self.repository_name
    }

    pub fn reference_name(&self) -> &ReferenceName {
        &self.reference_name
    }

    pub fn reference_type(&self) -> &ReferenceType {
        &self.reference_type
    }

    pub fn commit_id(&self) -> &CommitId {
        &self.commit_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }
}

impl fmt::Display for BackupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({})",
            self.repository_name,
            self.reference_name,
            self.commit_id.short()
        )
    }
}
