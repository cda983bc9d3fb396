//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module is the only place that touches `git2`. Everything the
//! changelog needs from a repository (commit ranges, tags, the current
//! branch, remotes, staging generated files) goes through [`Git`], which
//! normalizes failures into [`GitError`].
//!
//! # Example
//!
//! ```ignore
//! use relnote::git::{CommitSource, Git};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let commits = git.fetch_commits("v1.0.0", "v1.1.0")?;
//! println!("{} commits", commits.len());
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{CommitSource, TagLookup};
use crate::core::types::{RawCommit, UserIdentity};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// A revision (tag, branch, SHA) could not be resolved.
    #[error("revision not found: {rev}")]
    RevisionNotFound {
        /// The revision as given
        rev: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec
            | git2::ErrorCode::Ambiguous => GitError::RevisionNotFound {
                rev: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// A tag together with the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    /// Short tag name (no `refs/tags/`)
    pub name: String,
    /// SHA of the tagged commit
    pub sha: String,
    /// Commit time of the tagged commit
    pub time: chrono::DateTime<chrono::Utc>,
}

/// The pair of revisions a changelog is generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRange {
    /// Exclusive lower bound
    pub from: String,
    /// Inclusive upper bound
    pub to: String,
}

/// The Git interface.
///
/// This is the single point of interaction with Git. No other module
/// imports `git2`.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Root of the working tree.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    // =========================================================================
    // Revisions
    // =========================================================================

    /// Resolve any revision expression (tag, branch, SHA, `HEAD~2`) to the
    /// SHA of the commit it names.
    pub fn resolve_revision(&self, rev: &str) -> Result<String, GitError> {
        let object = self
            .repo
            .revparse_single(rev)
            .map_err(|e| GitError::from_git2(e, rev))?;
        let commit = object
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, rev))?;
        Ok(commit.id().to_string())
    }

    /// The current branch name, if HEAD is on a branch.
    pub fn current_branch(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        if head.is_branch() {
            head.shorthand().map(String::from)
        } else {
            None
        }
    }

    /// SHA of the repository's root commit reachable from HEAD.
    ///
    /// Returns `None` for an unborn HEAD.
    pub fn first_commit(&self) -> Result<Option<String>, GitError> {
        if self.repo.head().is_err() {
            return Ok(None);
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)?;

        match revwalk.next() {
            Some(oid) => Ok(Some(oid?.to_string())),
            None => Ok(None),
        }
    }

    /// All tags pointing at commits, newest commit first.
    ///
    /// Tags on non-commit objects are skipped.
    pub fn tags(&self) -> Result<Vec<TagEntry>, GitError> {
        let names = self.repo.tag_names(None)?;

        let mut tags = Vec::new();
        for name in names.iter().flatten() {
            let refname = format!("refs/tags/{}", name);
            let Ok(reference) = self.repo.find_reference(&refname) else {
                continue;
            };
            let Ok(commit) = reference.peel_to_commit() else {
                continue;
            };
            let time = chrono::DateTime::from_timestamp(commit.time().seconds(), 0)
                .unwrap_or(chrono::DateTime::UNIX_EPOCH);
            tags.push(TagEntry {
                name: name.to_string(),
                sha: commit.id().to_string(),
                time,
            });
        }

        // Newest first; ties broken by name so the order is stable.
        tags.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| b.name.cmp(&a.name)));
        Ok(tags)
    }

    /// Work out the revision range when the caller did not give both ends.
    ///
    /// - `to` defaults to the newest tag's commit, else `HEAD`
    /// - `from` defaults to the second-newest tag's commit, else the root commit
    ///
    /// Returns `None` if no lower bound exists (empty repository).
    pub fn discover_range(
        &self,
        previous: Option<&str>,
        current: Option<&str>,
    ) -> Result<Option<RevisionRange>, GitError> {
        let tags = self.tags()?;

        let from = match previous {
            Some(rev) => Some(rev.to_string()),
            None => match tags.get(1) {
                Some(tag) => Some(tag.sha.clone()),
                None => self.first_commit()?,
            },
        };
        let Some(from) = from else {
            return Ok(None);
        };

        let to = match current {
            Some(rev) => rev.to_string(),
            None => match tags.first() {
                Some(tag) => tag.sha.clone(),
                None => "HEAD".to_string(),
            },
        };

        Ok(Some(RevisionRange { from, to }))
    }

    // =========================================================================
    // Commits
    // =========================================================================

    /// Commits reachable from `to` but not from `from`, newest first.
    pub fn commits_between(&self, from: &str, to: &str) -> Result<Vec<RawCommit>, GitError> {
        let from_oid = self.resolve_oid(from)?;
        let to_oid = self.resolve_oid(to)?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(to_oid)?;
        revwalk.hide(from_oid)?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| GitError::from_git2(e, &oid.to_string()))?;
            commits.push(to_raw_commit(&commit));
        }

        Ok(commits)
    }

    fn resolve_oid(&self, rev: &str) -> Result<git2::Oid, GitError> {
        let object = self
            .repo
            .revparse_single(rev)
            .map_err(|e| GitError::from_git2(e, rev))?;
        let commit = object
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, rev))?;
        Ok(commit.id())
    }

    // =========================================================================
    // Remotes
    // =========================================================================

    /// Get the URL for a remote.
    ///
    /// Returns `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the default remote name (usually "origin").
    ///
    /// Returns the first remote found, or `None` if no remotes exist.
    pub fn default_remote(&self) -> Result<Option<String>, GitError> {
        let remotes = self.repo.remotes()?;

        if remotes.iter().flatten().any(|name| name == "origin") {
            return Ok(Some("origin".to_string()));
        }

        Ok(remotes.iter().flatten().next().map(String::from))
    }

    // =========================================================================
    // Index
    // =========================================================================

    /// Stage everything under `path` (relative to or inside the work tree).
    pub fn add_path(&self, path: &Path) -> Result<(), GitError> {
        let work_dir = self.work_dir()?;
        let relative = path.strip_prefix(work_dir).unwrap_or(path);
        let pathspec = if relative.as_os_str().is_empty() {
            ".".to_string()
        } else {
            relative.to_string_lossy().replace('\\', "/")
        };

        let mut index = self.repo.index()?;
        index.add_all([pathspec.as_str()], git2::IndexAddOption::DEFAULT, None)?;
        index.write()?;
        Ok(())
    }
}

impl CommitSource for Git {
    fn fetch_commits(&self, from: &str, to: &str) -> Result<Vec<RawCommit>, GitError> {
        self.commits_between(from, to)
    }
}

impl TagLookup for Git {
    fn tag_exists(&self, name: &str) -> Result<bool, GitError> {
        let refname = format!("refs/tags/{}", name);
        match self.repo.find_reference(&refname) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) if e.code() == git2::ErrorCode::InvalidSpec => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn to_raw_commit(commit: &git2::Commit<'_>) -> RawCommit {
    let author = commit.author();
    let committer = commit.committer();
    let timestamp = chrono::DateTime::from_timestamp(committer.when().seconds(), 0)
        .unwrap_or(chrono::DateTime::UNIX_EPOCH);

    RawCommit {
        sha: commit.id().to_string(),
        message: commit.message().unwrap_or("").to_string(),
        author: UserIdentity::new(
            author.name().unwrap_or(""),
            author.email().unwrap_or(""),
        ),
        committer: UserIdentity::new(
            committer.name().unwrap_or(""),
            committer.email().unwrap_or(""),
        ),
        timestamp,
        parent_count: commit.parent_count(),
    }
}
