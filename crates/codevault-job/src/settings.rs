//! Job settings, layered from an optional file and the process environment.
//!
//! Keys are the lowercased environment variable names, so a file entry
//! `retention_days = 30` and `RETENTION_DAYS=30` are equivalent. The
//! environment wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use codevault_core::{
    BackupError, BackupEvent, BackupRequest, Decision, RetentionPolicy, TriggerFilter, inputs,
};
use codevault_git::FetchConfig;
use serde::Deserialize;
use tracing::info;

use crate::store::{ServerSideEncryption, StoreTarget};

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The sources could not be read or deserialized.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// A setting has an unusable value.
    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

impl SettingsError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Raw settings as read from the sources.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub repository_name: Option<String>,
    pub reference_name: Option<String>,
    pub reference_type: Option<String>,
    pub commit_id: Option<String>,
    pub repo_region: Option<String>,
    pub account_id: Option<String>,

    /// Target bucket; shorthand for `backup_target = "s3://<name>"`.
    pub backup_bucket_name: Option<String>,
    /// Full target URL (`s3://`, `file://`, `memory://`). Takes precedence.
    pub backup_target: Option<String>,

    /// Comma separated branch names; empty monitors all branches.
    pub monitored_branches: Option<String>,
    /// Days until the store expires artifacts; `0` keeps them forever.
    pub retention_days: u32,
    /// Event bus the trigger rule listens on. Informational only.
    pub event_bus_name: Option<String>,

    pub source_url_template: Option<String>,
    pub shallow_depth: u32,
    pub fetch_timeout_secs: Option<u64>,
    /// `AES256` or `aws:kms`.
    pub s3_sse: Option<String>,
    /// Parent directory for scratch space.
    pub work_dir: Option<PathBuf>,
}

impl Settings {
    /// Loads settings from `file` (if it exists) and an environment map.
    ///
    /// `None` for `env` reads the process environment.
    pub fn from_sources(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(false));
        }
        builder = builder.add_source(config::Environment::default().source(env));

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Builds the backup request from the job inputs.
    pub fn request(&self) -> Result<BackupRequest, BackupError> {
        let required = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| BackupError::missing_input(name))
        };

        BackupRequest::new(
            required(&self.repository_name, inputs::REPOSITORY_NAME)?,
            required(&self.reference_name, inputs::REFERENCE_NAME)?,
            self.reference_type.clone().unwrap_or_default(),
            required(&self.commit_id, inputs::COMMIT_ID)?,
            required(&self.repo_region, inputs::REPO_REGION)?,
            self.account_id.clone().unwrap_or_default(),
        )
    }

    /// Decodes a trigger event and applies the branch filter.
    ///
    /// Returns `Ok(None)` when the event does not start a backup. Skipping
    /// is not a failure.
    pub fn request_from_event(&self, json: &str) -> Result<Option<BackupRequest>, BackupError> {
        let event = BackupEvent::from_json(json)?;
        match self.trigger_filter().evaluate(&event) {
            Decision::Accept => Ok(Some(BackupRequest::from_event(&event)?)),
            Decision::Skip(reason) => {
                info!(
                    "Skipping {} {} on {}: {}",
                    event.event, event.reference_name, event.repository_name, reason
                );
                Ok(None)
            },
        }
    }

    pub fn trigger_filter(&self) -> TriggerFilter {
        self.monitored_branches
            .as_deref()
            .map(TriggerFilter::from_list)
            .unwrap_or_default()
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::from_days(self.retention_days)
    }

    pub fn fetch_config(&self) -> Result<FetchConfig, SettingsError> {
        let mut builder = FetchConfig::builder().shallow_depth(self.shallow_depth);
        if let Some(template) = &self.source_url_template {
            builder = builder.url_template(template);
        }
        if let Some(secs) = self.fetch_timeout_secs {
            builder = builder.fetch_timeout(Duration::from_secs(secs));
        }
        builder
            .build()
            .map_err(|reason| SettingsError::invalid("source_url_template", reason))
    }

    /// Resolves where artifacts go.
    pub fn store_target(&self) -> Result<StoreTarget, SettingsError> {
        let raw = self
            .backup_target
            .as_deref()
            .or(self.backup_bucket_name.as_deref())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                SettingsError::invalid(
                    "backup_bucket_name",
                    format!("set {} or BACKUP_TARGET", inputs::BACKUP_BUCKET_NAME),
                )
            })?;

        StoreTarget::parse(raw).map_err(|e| SettingsError::invalid("backup_target", e.to_string()))
    }

    /// Parses the requested server-side encryption.
    pub fn sse(&self) -> Result<Option<ServerSideEncryption>, SettingsError> {
        match self.s3_sse.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some("AES256") => Ok(Some(ServerSideEncryption::Aes256)),
            Some("aws:kms") => Ok(Some(ServerSideEncryption::AwsKms)),
            Some(other) => Err(SettingsError::invalid(
                "s3_sse",
                format!("'{}' is not AES256 or aws:kms", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn job_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("REPOSITORY_NAME", "R"),
            ("REFERENCE_NAME", "main"),
            ("REFERENCE_TYPE", "branch"),
            ("COMMIT_ID", "abc123"),
            ("REPO_REGION", "eu-west-1"),
            ("ACCOUNT_ID", "123456789012"),
            ("BACKUP_BUCKET_NAME", "repo-backups"),
        ]
    }

    #[test]
    fn test_request_from_environment() {
        let settings = Settings::from_sources(None, env(&job_env())).unwrap();
        let request = settings.request().unwrap();

        assert_eq!(request.repository_name().as_str(), "R");
        assert_eq!(request.commit_id().as_str(), "abc123");
        assert_eq!(request.region(), "eu-west-1");
        assert_eq!(
            settings.store_target().unwrap(),
            StoreTarget::S3 {
                bucket: "repo-backups".into(),
                prefix: None
            }
        );
    }

    #[test]
    fn test_missing_commit_is_reported_by_name() {
        let mut pairs = job_env();
        pairs.retain(|(k, _)| *k != "COMMIT_ID");

        let settings = Settings::from_sources(None, env(&pairs)).unwrap();
        let err = settings.request().unwrap_err();

        assert!(err.to_string().contains("COMMIT_ID"));
    }

    fn event(kind: &str, ref_type: &str, reference: &str) -> String {
        format!(
            r#"{{
                "account": "123456789012",
                "region": "eu-west-1",
                "detail": {{
                    "event": "{kind}",
                    "repositoryName": "R",
                    "referenceName": "{reference}",
                    "referenceType": "{ref_type}",
                    "commitId": "abc123"
                }}
            }}"#
        )
    }

    #[test]
    fn test_event_on_monitored_branch_starts_backup() {
        let settings =
            Settings::from_sources(None, env(&[("MONITORED_BRANCHES", "main,release")])).unwrap();

        let request = settings
            .request_from_event(&event("referenceUpdated", "branch", "release"))
            .unwrap()
            .expect("monitored branch should be backed up");

        assert_eq!(request.reference_name().as_str(), "release");
        assert_eq!(request.region(), "eu-west-1");
    }

    #[test]
    fn test_event_skips_are_not_errors() {
        let settings =
            Settings::from_sources(None, env(&[("MONITORED_BRANCHES", "main")])).unwrap();

        for json in [
            event("referenceUpdated", "branch", "feature/x"),
            event("referenceCreated", "tag", "v1.0.0"),
            event("referenceDeleted", "branch", "main"),
        ] {
            assert_eq!(settings.request_from_event(&json).unwrap(), None, "{json}");
        }
    }

    #[test]
    fn test_malformed_event_is_an_error() {
        let settings = Settings::from_sources(None, env(&[])).unwrap();

        let err = settings.request_from_event("{\"detail\": 1}").unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_sources(None, env(&[])).unwrap();

        assert_eq!(settings.retention(), RetentionPolicy::Forever);
        assert!(settings.trigger_filter().branches().is_empty());
        assert_eq!(settings.sse().unwrap(), None);
        assert!(settings.store_target().is_err());
        assert_eq!(settings.fetch_config().unwrap().shallow_depth(), None);
    }

    #[test]
    fn test_optional_settings() {
        let settings = Settings::from_sources(
            None,
            env(&[
                ("MONITORED_BRANCHES", "main, release"),
                ("RETENTION_DAYS", "30"),
                ("BACKUP_TARGET", "file:///srv/backups"),
                ("BACKUP_BUCKET_NAME", "ignored"),
                ("S3_SSE", "aws:kms"),
                ("SOURCE_URL_TEMPLATE", "file:///git/{repository}"),
                ("SHALLOW_DEPTH", "1"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.trigger_filter().branches(), &["main", "release"]);
        assert_eq!(settings.retention().expiration_days(), Some(30));
        assert_eq!(
            settings.store_target().unwrap(),
            StoreTarget::Local(PathBuf::from("/srv/backups"))
        );
        assert_eq!(settings.sse().unwrap(), Some(ServerSideEncryption::AwsKms));

        let fetch = settings.fetch_config().unwrap();
        assert_eq!(fetch.source_url("R", "x"), "file:///git/R");
        assert!(fetch.shallow_depth().is_some());
    }

    #[test]
    fn test_invalid_sse() {
        let settings = Settings::from_sources(None, env(&[("S3_SSE", "rot13")])).unwrap();
        assert!(settings.sse().is_err());
    }

    #[test]
    fn test_file_then_environment() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("codevault.toml");
        std::fs::write(
            &file,
            "backup_bucket_name = \"from-file\"\nretention_days = 7\n",
        )
        .unwrap();

        let settings =
            Settings::from_sources(Some(file.as_path()), env(&[("RETENTION_DAYS", "14")])).unwrap();

        assert_eq!(settings.backup_bucket_name.as_deref(), Some("from-file"));
        assert_eq!(settings.retention_days, 14);
    }
}
