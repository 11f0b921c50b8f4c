#![allow(dead_code)]
use chrono::{DateTime, TimeZone, Utc};
use codevault_core::BackupRequest;

/// Builds a valid branch request. Panics on invalid input (intended for tests).
pub fn request(repo: &str, branch: &str, commit: &str) -> BackupRequest {
    BackupRequest::new(repo, branch, "branch", commit, "us-east-1", "123456789012")
        .expect("Failed to create test request")
}

/// A fixed instant, offset by `secs` seconds.
pub fn instant(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 0).unwrap() + chrono::Duration::seconds(secs)
}

/// A trigger event payload as delivered by the event bus.
pub fn event_json(event: &str, ref_type: &str, branch: &str, commit: &str) -> String {
    format!(
        r#"{{
            "version": "0",
            "detail-type": "CodeCommit Repository State Change",
            "source": "aws.codecommit",
            "account": "123456789012",
            "region": "us-east-1",
            "detail": {{
                "event": "{event}",
                "repositoryName": "R",
                "referenceType": "{ref_type}",
                "referenceName": "{branch}",
                "commitId": "{commit}"
            }}
        }}"#
    )
}
