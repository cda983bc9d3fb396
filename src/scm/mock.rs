//! scm::mock
//!
//! Mock hosting-service client for deterministic testing.
//!
//! # Design
//!
//! [`MockScm`] stores issues, users and releases in memory, records every
//! call, and can be told to fail specific operations. Clones share state,
//! so a test can hand one clone to the pipeline and inspect the other.
//!
//! # Example
//!
//! ```
//! use relnote::scm::mock::MockScm;
//! use relnote::scm::{Issue, IssueTracker};
//!
//! # tokio_test::block_on(async {
//! let scm = MockScm::new().with_issue(
//!     "42",
//!     Issue {
//!         title: "Crash on start".to_string(),
//!         ..Default::default()
//!     },
//! );
//!
//! let issue = scm.get_issue("42").await.unwrap().unwrap();
//! assert_eq!(issue.title, "Crash on start");
//! assert!(scm.get_issue("7").await.unwrap().is_none());
//! assert_eq!(scm.issue_lookups("42"), 1);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::traits::{
    Issue, IssueTracker, Release, ReleaseInput, ReleaseStore, ScmClient, ScmError, TrackerKind,
    UserDirectory,
};
use crate::core::types::CanonicalUser;

/// Mock client for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockScm {
    inner: Arc<Mutex<MockScmInner>>,
}

#[derive(Debug)]
struct MockScmInner {
    kind: TrackerKind,
    issues: HashMap<String, Issue>,
    /// Keyed by lower-cased email.
    users_by_email: HashMap<String, CanonicalUser>,
    /// Keyed by lower-cased login.
    users_by_login: HashMap<String, CanonicalUser>,
    contributors: Vec<CanonicalUser>,
    releases: HashMap<u64, Release>,
    next_release_id: u64,
    fail_on: Vec<FailOn>,
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail get_issue; for one identifier, or for all when `id` is `None`.
    GetIssue {
        id: Option<String>,
        error: ScmError,
    },
    /// Fail find_user_by_email with the given error.
    FindUserByEmail(ScmError),
    /// Fail find_user_by_login with the given error.
    FindUserByLogin(ScmError),
    /// Fail contributors with the given error.
    Contributors(ScmError),
    /// Fail find_release_by_tag with the given error.
    FindReleaseByTag(ScmError),
    /// Fail create_release with the given error.
    CreateRelease(ScmError),
    /// Fail update_release with the given error.
    UpdateRelease(ScmError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    GetIssue { id: String },
    FindUserByEmail { email: String },
    FindUserByLogin { login: String },
    Contributors,
    FindReleaseByTag { tag: String },
    CreateRelease { tag: String, title: String },
    UpdateRelease { id: u64, tag: String },
}

impl MockScm {
    /// Create an empty mock with a numeric (`#123`) tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockScmInner {
                kind: TrackerKind::Git,
                issues: HashMap::new(),
                users_by_email: HashMap::new(),
                users_by_login: HashMap::new(),
                contributors: Vec::new(),
                releases: HashMap::new(),
                next_release_id: 1,
                fail_on: Vec::new(),
                operations: Vec::new(),
            })),
        }
    }

    /// Set the tracker kind reported by [`IssueTracker::kind`].
    pub fn with_kind(self, kind: TrackerKind) -> Self {
        self.inner.lock().unwrap().kind = kind;
        self
    }

    /// Add an issue or pull request under an identifier.
    pub fn with_issue(self, id: impl Into<String>, issue: Issue) -> Self {
        self.inner.lock().unwrap().issues.insert(id.into(), issue);
        self
    }

    /// Add a directory user, indexed by email and login.
    pub fn with_user(self, user: CanonicalUser) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            if !user.email.is_empty() {
                inner
                    .users_by_email
                    .insert(user.email.to_lowercase(), user.clone());
            }
            if let Some(login) = &user.login {
                inner
                    .users_by_login
                    .insert(login.to_lowercase(), user.clone());
            }
        }
        self
    }

    /// Add a repository contributor (used for name matching only).
    pub fn with_contributor(self, user: CanonicalUser) -> Self {
        self.inner.lock().unwrap().contributors.push(user);
        self
    }

    /// Add an existing release.
    pub fn with_release(self, release: Release) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.next_release_id = inner.next_release_id.max(release.id + 1);
            inner.releases.insert(release.id, release);
        }
        self
    }

    /// Configure the mock to fail an operation. May be called repeatedly.
    ///
    /// # Example
    ///
    /// ```
    /// use relnote::scm::mock::{FailOn, MockScm};
    /// use relnote::scm::ScmError;
    ///
    /// let scm = MockScm::new().fail_on(FailOn::CreateRelease(ScmError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.inner.lock().unwrap().fail_on.push(fail_on);
        self
    }

    /// Clear all failure configuration.
    pub fn clear_fail_on(&self) {
        self.inner.lock().unwrap().fail_on.clear();
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// How many times an issue identifier was looked up.
    pub fn issue_lookups(&self, id: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::GetIssue { id: looked_up } if looked_up == id))
            .count()
    }

    /// All stored releases, ordered by id.
    pub fn releases(&self) -> Vec<Release> {
        let inner = self.inner.lock().unwrap();
        let mut releases: Vec<Release> = inner.releases.values().cloned().collect();
        releases.sort_by_key(|r| r.id);
        releases
    }

    fn record(&self, op: MockOperation) {
        self.inner.lock().unwrap().operations.push(op);
    }

    /// Return the configured error for an operation, if any.
    fn check_fail(&self, matches: impl Fn(&FailOn) -> Option<&ScmError>) -> Option<ScmError> {
        let inner = self.inner.lock().unwrap();
        inner.fail_on.iter().find_map(|f| matches(f).cloned())
    }

    fn release_link(tag: &str) -> String {
        format!("https://github.com/mock/repo/releases/tag/{}", tag)
    }
}

impl Default for MockScm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IssueTracker for MockScm {
    fn kind(&self) -> TrackerKind {
        self.inner.lock().unwrap().kind
    }

    fn home_url(&self) -> String {
        "https://github.com/mock/repo".to_string()
    }

    async fn get_issue(&self, id: &str) -> Result<Option<Issue>, ScmError> {
        self.record(MockOperation::GetIssue { id: id.to_string() });

        if let Some(e) = self.check_fail(|f| match f {
            FailOn::GetIssue { id: None, error } => Some(error),
            FailOn::GetIssue {
                id: Some(failing),
                error,
            } if failing == id => Some(error),
            _ => None,
        }) {
            return Err(e);
        }

        Ok(self.inner.lock().unwrap().issues.get(id).cloned())
    }
}

#[async_trait]
impl UserDirectory for MockScm {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<CanonicalUser>, ScmError> {
        self.record(MockOperation::FindUserByEmail {
            email: email.to_string(),
        });

        if let Some(e) = self.check_fail(|f| match f {
            FailOn::FindUserByEmail(e) => Some(e),
            _ => None,
        }) {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        Ok(inner.users_by_email.get(&email.to_lowercase()).cloned())
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<CanonicalUser>, ScmError> {
        self.record(MockOperation::FindUserByLogin {
            login: login.to_string(),
        });

        if let Some(e) = self.check_fail(|f| match f {
            FailOn::FindUserByLogin(e) => Some(e),
            _ => None,
        }) {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        Ok(inner.users_by_login.get(&login.to_lowercase()).cloned())
    }

    async fn contributors(&self) -> Result<Vec<CanonicalUser>, ScmError> {
        self.record(MockOperation::Contributors);

        if let Some(e) = self.check_fail(|f| match f {
            FailOn::Contributors(e) => Some(e),
            _ => None,
        }) {
            return Err(e);
        }

        Ok(self.inner.lock().unwrap().contributors.clone())
    }
}

#[async_trait]
impl ReleaseStore for MockScm {
    fn full_name(&self) -> String {
        "mock/repo".to_string()
    }

    async fn find_release_by_tag(&self, tag: &str) -> Result<Option<Release>, ScmError> {
        self.record(MockOperation::FindReleaseByTag {
            tag: tag.to_string(),
        });

        if let Some(e) = self.check_fail(|f| match f {
            FailOn::FindReleaseByTag(e) => Some(e),
            _ => None,
        }) {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        Ok(inner.releases.values().find(|r| r.tag == tag).cloned())
    }

    async fn create_release(&self, input: &ReleaseInput) -> Result<Release, ScmError> {
        self.record(MockOperation::CreateRelease {
            tag: input.tag.clone(),
            title: input.title.clone(),
        });

        if let Some(e) = self.check_fail(|f| match f {
            FailOn::CreateRelease(e) => Some(e),
            _ => None,
        }) {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_release_id;
        inner.next_release_id += 1;

        let release = Release {
            id,
            tag: input.tag.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            link: Self::release_link(&input.tag),
        };
        inner.releases.insert(id, release.clone());
        Ok(release)
    }

    async fn update_release(&self, id: u64, input: &ReleaseInput) -> Result<Release, ScmError> {
        self.record(MockOperation::UpdateRelease {
            id,
            tag: input.tag.clone(),
        });

        if let Some(e) = self.check_fail(|f| match f {
            FailOn::UpdateRelease(e) => Some(e),
            _ => None,
        }) {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        let release = inner
            .releases
            .get_mut(&id)
            .ok_or_else(|| ScmError::NotFound(format!("release {}", id)))?;

        release.title = input.title.clone();
        release.tag = input.tag.clone();
        release.description = input.description.clone();
        Ok(release.clone())
    }
}

impl ScmClient for MockScm {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn as_tracker(&self) -> &dyn IssueTracker {
        self
    }

    fn as_directory(&self) -> &dyn UserDirectory {
        self
    }

    fn as_release_store(&self) -> &dyn ReleaseStore {
        self
    }
}
