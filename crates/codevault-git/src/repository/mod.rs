//! Git repository management.
//!
//! This module provides the clone of a single reference into a fresh
//! working tree.

mod config;
mod git_ops;
mod refs;

pub use config::{FetchConfig, FetchConfigBuilder};
pub use git_ops::GitRepository;
pub use refs::GitRef;
