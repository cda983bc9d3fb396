//! core::types
//!
//! Data model for changelog generation.
//!
//! # Types
//!
//! - [`RawCommit`] - A commit as supplied by the commit source
//! - [`UserIdentity`] - Raw name/email pair from git or the issue tracker
//! - [`CanonicalUser`] - A resolved, deduplicated user
//! - [`IssueSummary`] - An enriched issue or pull request
//! - [`CommitSummary`] - One changelog entry per included commit
//! - [`DependencyUpdate`] - A dependency bump, possibly collapsed
//! - [`RepositoryInfo`] - Owner/name/URLs of the repository being released
//! - [`ReleaseRecord`] - The persisted release summary
//!
//! # Serialization
//!
//! Records serialize with camelCase keys so the persisted document matches
//! what downstream chart tooling expects (`gitOwner`, `releaseNotesURL`, ...).
//! Empty optional fields are omitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw identity as recorded in version control or the issue tracker.
///
/// Not guaranteed to be unique or normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

impl UserIdentity {
    /// Create an identity from a name and email.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Whether both name and email are present.
    ///
    /// Only complete identities are worth resolving.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty()
    }

    /// Deduplication key: lower-cased email, falling back to the name.
    ///
    /// # Example
    ///
    /// ```
    /// use relnote::core::types::UserIdentity;
    ///
    /// let a = UserIdentity::new("Jane", "Jane@Example.com");
    /// let b = UserIdentity::new("jane doe", "jane@example.com");
    /// assert_eq!(a.key(), b.key());
    /// ```
    pub fn key(&self) -> String {
        let email = self.email.trim();
        if email.is_empty() {
            self.name.trim().to_lowercase()
        } else {
            email.to_lowercase()
        }
    }
}

impl std::fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// A commit supplied by the commit source. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    /// Full commit SHA
    pub sha: String,
    /// Full commit message (may be multi-line)
    pub message: String,
    /// Author identity
    pub author: UserIdentity,
    /// Committer identity
    pub committer: UserIdentity,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// Number of parents (more than one means a merge commit)
    pub parent_count: usize,
}

impl RawCommit {
    /// Whether this is a merge commit.
    pub fn is_merge(&self) -> bool {
        self.parent_count > 1
    }
}

/// A resolved user identity.
///
/// Many [`UserIdentity`] values may resolve to the same canonical user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalUser {
    /// Linked account handle on the hosting service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Email address
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// Profile URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Avatar image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl CanonicalUser {
    /// Build an unlinked user straight from a raw identity.
    ///
    /// Used as the fallback when nothing better can be resolved.
    pub fn from_identity(identity: &UserIdentity) -> Self {
        Self {
            name: identity.name.clone(),
            email: identity.email.clone(),
            ..Default::default()
        }
    }

    /// Build a user that is only known by its account handle.
    pub fn from_login(login: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            name: login.clone(),
            login: Some(login),
            ..Default::default()
        }
    }

    /// Text used when the user is mentioned in markdown.
    ///
    /// Prefers the account handle, then the name, then the email.
    pub fn display_name(&self) -> &str {
        match &self.login {
            Some(login) if !login.is_empty() => login,
            _ if !self.name.is_empty() => &self.name,
            _ => &self.email,
        }
    }
}

/// An issue or pull request referenced by at least one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    /// Identifier as referenced in commit messages (`42`, `ABC-123`)
    pub id: String,
    /// Web URL
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Body text
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    /// State as reported by the tracker (`open`, `closed`, ...)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    /// When the issue was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    /// Author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<CanonicalUser>,
    /// Who closed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<CanonicalUser>,
    /// Assignees
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<CanonicalUser>,
    /// Label names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Whether the tracker reports this as a pull request
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pull_request: bool,
}

/// One changelog entry per included commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    /// Full commit SHA
    pub sha: String,
    /// Full commit message
    pub message: String,
    /// Web URL of the commit
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Branch the release was cut from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    /// Resolved author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<CanonicalUser>,
    /// Resolved committer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer: Option<CanonicalUser>,
    /// Identifiers of the issues/PRs this commit references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issue_ids: Vec<String>,
}

impl CommitSummary {
    /// First line of the message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }
}

/// A dependency version bump.
///
/// Records sharing `(owner, repo, component)` are collapsed into one record
/// spanning the earliest "from" and the latest "to".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyUpdate {
    /// Git host (e.g. `github.com`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Component inside the repository (may be empty)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub component: String,
    /// Repository web URL
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Version before the bump
    pub from_version: String,
    /// Release name of the old version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_release_name: Option<String>,
    /// Release page of the old version
    #[serde(
        default,
        rename = "fromReleaseHTMLURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub from_release_html_url: Option<String>,
    /// Version after the bump
    pub to_version: String,
    /// Release name of the new version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_release_name: Option<String>,
    /// Release page of the new version
    #[serde(
        default,
        rename = "toReleaseHTMLURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub to_release_html_url: Option<String>,
}

impl DependencyUpdate {
    /// The grouping key used when collapsing.
    pub fn group_key(&self) -> (&str, &str, &str) {
        (&self.owner, &self.repo, &self.component)
    }
}

/// Repository metadata carried on the release record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Owner (user or organization)
    #[serde(rename = "gitOwner", default)]
    pub owner: String,
    /// Repository name
    #[serde(rename = "gitRepository", default)]
    pub name: String,
    /// HTTPS web URL
    #[serde(rename = "gitHttpURL", default, skip_serializing_if = "String::is_empty")]
    pub https_url: String,
    /// Clone URL
    #[serde(rename = "gitCloneURL", default, skip_serializing_if = "String::is_empty")]
    pub clone_url: String,
}

/// The structured summary of a release.
///
/// Built once per run. Only `release_notes_url` changes afterwards, when the
/// remote release has been published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRecord {
    /// Application name
    pub name: String,
    /// Version being released
    pub version: String,
    /// Repository metadata
    #[serde(flatten)]
    pub repository: RepositoryInfo,
    /// Commits in commit-source order
    #[serde(default)]
    pub commits: Vec<CommitSummary>,
    /// Referenced issues (unique by id)
    #[serde(default)]
    pub issues: Vec<IssueSummary>,
    /// Referenced pull requests (unique by id)
    #[serde(default)]
    pub pull_requests: Vec<IssueSummary>,
    /// Collapsed dependency updates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependency_updates: Vec<DependencyUpdate>,
    /// Release notes page, back-filled after publishing
    #[serde(
        rename = "releaseNotesURL",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub release_notes_url: String,
}

impl ReleaseRecord {
    /// Look up an issue or pull request by identifier.
    pub fn find_issue(&self, id: &str) -> Option<&IssueSummary> {
        self.issues
            .iter()
            .chain(self.pull_requests.iter())
            .find(|issue| issue.id == id)
    }

    /// The most recent commit in the record, by commit-source order.
    pub fn last_commit(&self) -> Option<&CommitSummary> {
        self.commits.last()
    }
}
