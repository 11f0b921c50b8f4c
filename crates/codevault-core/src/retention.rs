//! How long the target store keeps artifacts.
//!
//! Expiry itself is carried out by the store's lifecycle rules; the job
//! only reports the configured policy alongside each upload.

use serde::Serialize;
use std::fmt;

/// Retention configured for the backup bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum RetentionPolicy {
    /// Artifacts are never expired.
    #[default]
    Forever,
    /// Artifacts expire this many days after creation.
    Days { days: u32 },
}

impl RetentionPolicy {
    /// Maps the configured day count; `0` keeps artifacts forever.
    pub fn from_days(days: u32) -> Self {
        if days == 0 {
            Self::Forever
        } else {
            Self::Days { days }
        }
    }

    /// Returns the expiry in days, or `None` when artifacts are kept forever.
    pub fn expiration_days(&self) -> Option<u32> {
        match self {
            Self::Forever => None,
            Self::Days { days } => Some(*days),
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forever => f.write_str("forever"),
            Self::Days { days } => write!(f, "{} days", days),
        }
    }
}
