//! changelog
//!
//! The changelog assembly pipeline.
//!
//! # Flow
//!
//! ```text
//! CommitSource ──► CommitAssembler ──► ReleaseRecordBuilder ──► render + templates
//!                   │  UserResolver        │ collapse
//!                   │  IssuePattern        ▼
//!                   └─ IssueEnricher     ReleaseRecord ──► publish / sinks / activity
//! ```
//!
//! # Modules
//!
//! - [`extract`]: issue reference patterns
//! - [`users`]: user resolution with a run-scoped cache
//! - [`enrich`]: issue lookups, once per identifier
//! - [`assemble`]: one summary per included commit
//! - [`deps`]: dependency bump parsing and collapsing
//! - [`record`]: the release record and its YAML document
//! - [`render`]: the markdown body
//! - [`template`]: header/footer templates
//! - [`pipeline`]: a full run from commits to markdown
//! - [`publish`]: remote release, tag names and output files
//! - [`activity`]: pipeline activity records
//!
//! # Errors
//!
//! Only structural failures surface as [`ChangelogError`]. Tracker and user
//! lookup problems are logged where they happen and never leave the
//! assembler.

pub mod activity;
pub mod assemble;
pub mod deps;
pub mod enrich;
pub mod extract;
pub mod pipeline;
pub mod publish;
pub mod record;
pub mod render;
pub mod template;
pub mod users;

use std::path::PathBuf;

use thiserror::Error;

use crate::git::GitError;
use crate::scm::ScmError;
use template::TemplateError;

pub use pipeline::{generate, Changelog, ChangelogOptions};

/// Errors that abort a changelog run.
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// Repository access failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// No commits between the two revisions and that was configured as fatal.
    #[error("no commits found between {from} and {to}")]
    NoCommits { from: String, to: String },

    /// A header or footer template could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Querying the release store failed for a reason other than "not found".
    #[error("failed to query release on repo {repo} for tag {tag}: {source}")]
    ReleaseQuery {
        repo: String,
        tag: String,
        #[source]
        source: ScmError,
    },

    /// A required file could not be read or written.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document could not be serialized or parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// No chart was found to place generated files next to.
    #[error("could not find a helm chart under {0}; set templates_dir")]
    TemplatesDirNotFound(PathBuf),
}

impl ChangelogError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ChangelogError::Io {
            path: path.into(),
            source,
        }
    }
}
