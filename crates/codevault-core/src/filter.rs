//! Decides whether a trigger event should start a backup.

use std::fmt;

use crate::event::BackupEvent;

/// Outcome of evaluating an event against a [`TriggerFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Skip(SkipReason),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Why an event was not backed up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The reference is a tag or other non-branch ref.
    NotABranch(String),
    /// The event was a deletion or another non-snapshot change.
    EventNotQualifying(String),
    /// The branch is not in the monitored list.
    BranchNotMonitored(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotABranch(kind) => write!(f, "reference type '{}' is not a branch", kind),
            Self::EventNotQualifying(event) => {
                write!(f, "event '{}' does not produce a snapshot", event)
            },
            Self::BranchNotMonitored(branch) => {
                write!(f, "branch '{}' is not monitored", branch)
            },
        }
    }
}

/// Branch allow-list applied to incoming events.
///
/// An empty list monitors every branch.
///
/// # Example
///
/// ```
/// use codevault_core::TriggerFilter;
///
/// let filter = TriggerFilter::from_list("main, release");
/// assert!(filter.monitors("main"));
/// assert!(!filter.monitors("feature/x"));
/// assert!(TriggerFilter::all().monitors("feature/x"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerFilter {
    branches: Vec<String>,
}

impl TriggerFilter {
    /// A filter that monitors all branches.
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a filter from explicit branch names.
    pub fn new(branches: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let branches = branches
            .into_iter()
            .map(Into::into)
            .map(|b: String| b.trim().trim_start_matches("refs/heads/").to_string())
            .filter(|b| !b.is_empty())
            .collect();
        Self { branches }
    }

    /// Parses a comma separated list, as supplied through configuration.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Returns the monitored branches; empty means all.
    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    /// Returns true if `branch` is monitored.
    pub fn monitors(&self, branch: &str) -> bool {
        self.branches.is_empty() || self.branches.iter().any(|b| b == branch)
    }

    /// Evaluates a trigger event.
    pub fn evaluate(&self, event: &BackupEvent) -> Decision {
        if event.reference_type != crate::event::ReferenceType::Branch {
            return Decision::Skip(SkipReason::NotABranch(
                event.reference_type.as_str().to_string(),
            ));
        }
        if !event.event.produces_snapshot() {
            return Decision::Skip(SkipReason::EventNotQualifying(
                event.event.as_str().to_string(),
            ));
        }
        if !self.monitors(&event.reference_name) {
            return Decision::Skip(SkipReason::BranchNotMonitored(
                event.reference_name.clone(),
            ));
        }
        Decision::Accept
    }
}
