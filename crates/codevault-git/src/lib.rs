//! # Codevault Git
//!
//! Fetches the working tree a backup request points at.
//!
//! ## Features
//!
//! - Clones via gix, no system `git` required
//! - Branch and tag references, full or shallow history
//! - Clone URL built from a template (`{repository}`, `{region}`)
//! - Async `SourceFetcher` trait so the pipeline can be tested without a remote
//!
//! ## Example
//!
//! ```ignore
//! use codevault_git::{FetchConfig, GitFetcher, SourceFetcher};
//!
//! let fetcher = GitFetcher::new(FetchConfig::builder().build()?);
//! let tree = fetcher.fetch(&request, workdir.path()).await?;
//! println!("fetched {}", tree.head_commit);
//! ```

pub mod error;
pub mod fetcher;
pub mod repository;

// Re-exports
pub use error::FetchError;
pub use fetcher::{FetchedTree, GitFetcher, SourceFetcher};
pub use repository::{FetchConfig, FetchConfigBuilder, GitRef, GitRepository};
