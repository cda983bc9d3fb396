//! git
//!
//! Repository access for changelog generation.
//!
//! # Architecture
//!
//! [`Git`] is the only doorway to `git2`. The changelog pipeline itself never
//! sees a repository: it consumes commits through [`CommitSource`] and asks
//! about tags through [`TagLookup`], so tests can feed it plain vectors.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Revision resolution and range discovery from tags
//! - Commit range listing
//! - Remote URL lookup and parsing ([`GitUrl`])
//! - Staging generated files

mod interface;
mod url;

pub use interface::{Git, GitError, RevisionRange, TagEntry};
pub use url::GitUrl;

use crate::core::types::RawCommit;

/// Supplies the ordered commits between two revisions.
pub trait CommitSource {
    /// Commits reachable from `to` but not from `from`, in source order.
    ///
    /// May return an empty list. A revision that cannot be resolved is an
    /// error; the caller decides whether that is fatal.
    fn fetch_commits(&self, from: &str, to: &str) -> Result<Vec<RawCommit>, GitError>;
}

/// Answers whether a tag exists in the repository.
pub trait TagLookup {
    /// Whether `refs/tags/<name>` exists.
    fn tag_exists(&self, name: &str) -> Result<bool, GitError>;
}

impl CommitSource for Vec<RawCommit> {
    fn fetch_commits(&self, _from: &str, _to: &str) -> Result<Vec<RawCommit>, GitError> {
        Ok(self.clone())
    }
}

impl TagLookup for Vec<&str> {
    fn tag_exists(&self, name: &str) -> Result<bool, GitError> {
        Ok(self.iter().any(|tag| *tag == name))
    }
}
