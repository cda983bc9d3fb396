//! scm::traits
//!
//! Interfaces to the hosting service that owns the repository.
//!
//! # Design
//!
//! Three narrow traits, one per concern the changelog needs:
//!
//! - [`IssueTracker`] looks issues and pull requests up by identifier
//! - [`UserDirectory`] maps emails, handles and names to account records
//! - [`ReleaseStore`] finds, creates and updates release objects
//!
//! A concrete client normally implements all three and is handed around as
//! `dyn ScmClient`. The traits are async because every call is a network
//! round-trip, and all methods return `Result` so callers decide what is
//! fatal. The changelog treats most of these failures as recoverable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::types::CanonicalUser;

/// Errors from hosting-service operations.
#[derive(Debug, Clone, Error)]
pub enum ScmError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The operation is not supported by this client.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

/// How issues are referenced in commit messages for a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerKind {
    /// Numeric references such as `#123` (GitHub, GitLab, Gitea)
    #[default]
    Git,
    /// Project-key references such as `ABC-123`
    Jira,
}

impl TrackerKind {
    /// Parse a kind from its configuration name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "git" | "github" => Some(TrackerKind::Git),
            "jira" => Some(TrackerKind::Jira),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerKind::Git => write!(f, "git"),
            TrackerKind::Jira => write!(f, "jira"),
        }
    }
}

/// A user as the tracker reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerUser {
    /// Account handle
    pub login: String,
    /// Display name, when the tracker includes it
    pub name: Option<String>,
    /// Email, when the tracker includes it
    pub email: Option<String>,
    /// Profile URL
    pub url: Option<String>,
    /// Avatar URL
    pub avatar_url: Option<String>,
}

impl TrackerUser {
    /// Create a user known only by handle.
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            ..Default::default()
        }
    }

    /// Convert to a canonical user without any directory lookup.
    pub fn to_canonical(&self) -> CanonicalUser {
        CanonicalUser {
            login: Some(self.login.clone()),
            name: self.name.clone().unwrap_or_else(|| self.login.clone()),
            email: self.email.clone().unwrap_or_default(),
            url: self.url.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// An issue or pull request as returned by the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issue {
    /// Web URL
    pub url: String,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
    /// State (`open`, `closed`, ...)
    pub state: String,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
    /// Author
    pub author: Option<TrackerUser>,
    /// Who closed it; `None` if open or unknown
    pub closed_by: Option<TrackerUser>,
    /// Assignees; `None` if the tracker did not report them
    pub assignees: Option<Vec<TrackerUser>>,
    /// Label names
    pub labels: Vec<String>,
    /// Whether this is a pull request rather than an issue
    pub pull_request: bool,
}

/// A release object on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Release identifier
    pub id: u64,
    /// Tag the release is attached to
    pub tag: String,
    /// Release title
    pub title: String,
    /// Release notes (markdown)
    pub description: String,
    /// Web URL of the release page (may be empty)
    pub link: String,
}

/// Fields sent when creating or updating a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInput {
    /// Release title
    pub title: String,
    /// Tag name
    pub tag: String,
    /// Release notes (markdown)
    pub description: String,
}

/// Issue lookups for the repository being released.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Which reference syntax this tracker uses.
    fn kind(&self) -> TrackerKind;

    /// Home page of the tracker; used in diagnostics only.
    fn home_url(&self) -> String;

    /// Fetch an issue or pull request by identifier.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the identifier does not exist.
    ///
    /// # Errors
    ///
    /// - `NetworkError` / `ApiError` / `RateLimited` on transport failures
    /// - `AuthFailed` if the token cannot read issues
    async fn get_issue(&self, id: &str) -> Result<Option<Issue>, ScmError>;
}

/// Account records used to canonicalize commit and issue identities.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find the account whose (public) email matches.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<CanonicalUser>, ScmError>;

    /// Find the account with this handle.
    async fn find_user_by_login(&self, login: &str) -> Result<Option<CanonicalUser>, ScmError>;

    /// Recent contributors to the repository, used for name matching.
    async fn contributors(&self) -> Result<Vec<CanonicalUser>, ScmError>;
}

/// Release objects for the repository being released.
#[async_trait]
pub trait ReleaseStore: Send + Sync {
    /// `owner/repo` of the repository this store writes to.
    fn full_name(&self) -> String;

    /// Find the release attached to a tag.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if no release exists for the tag.
    async fn find_release_by_tag(&self, tag: &str) -> Result<Option<Release>, ScmError>;

    /// Create a new release.
    async fn create_release(&self, input: &ReleaseInput) -> Result<Release, ScmError>;

    /// Update an existing release.
    async fn update_release(&self, id: u64, input: &ReleaseInput) -> Result<Release, ScmError>;
}

/// A hosting-service client providing every capability the changelog uses.
///
/// The `as_*` accessors hand out the individual capabilities of a boxed
/// client, since the changelog pipeline takes them separately.
pub trait ScmClient: IssueTracker + UserDirectory + ReleaseStore {
    /// Client name (e.g. "github", "mock", "offline").
    fn name(&self) -> &'static str;

    /// This client as an issue tracker.
    fn as_tracker(&self) -> &dyn IssueTracker;

    /// This client as a user directory.
    fn as_directory(&self) -> &dyn UserDirectory;

    /// This client as a release store.
    fn as_release_store(&self) -> &dyn ReleaseStore;
}
