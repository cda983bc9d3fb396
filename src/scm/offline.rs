//! scm::offline
//!
//! A client that never touches the network.
//!
//! Used with `--offline`, when the remote is not a supported host, and as
//! the tracker for project-key (`ABC-123`) references, which have no
//! client. Issue and user lookups find nothing, so the changelog is built
//! from git data alone; release writes are refused.

use async_trait::async_trait;

use super::traits::{
    Issue, IssueTracker, Release, ReleaseInput, ReleaseStore, ScmClient, ScmError, TrackerKind,
    UserDirectory,
};
use crate::core::types::CanonicalUser;

/// Network-free client.
#[derive(Debug, Clone)]
pub struct OfflineScm {
    kind: TrackerKind,
    full_name: String,
}

impl OfflineScm {
    /// Create an offline client for `owner/repo` using the given reference syntax.
    pub fn new(kind: TrackerKind, full_name: impl Into<String>) -> Self {
        Self {
            kind,
            full_name: full_name.into(),
        }
    }
}

#[async_trait]
impl IssueTracker for OfflineScm {
    fn kind(&self) -> TrackerKind {
        self.kind
    }

    fn home_url(&self) -> String {
        String::new()
    }

    async fn get_issue(&self, _id: &str) -> Result<Option<Issue>, ScmError> {
        Ok(None)
    }
}

#[async_trait]
impl UserDirectory for OfflineScm {
    async fn find_user_by_email(&self, _email: &str) -> Result<Option<CanonicalUser>, ScmError> {
        Ok(None)
    }

    async fn find_user_by_login(&self, _login: &str) -> Result<Option<CanonicalUser>, ScmError> {
        Ok(None)
    }

    async fn contributors(&self) -> Result<Vec<CanonicalUser>, ScmError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl ReleaseStore for OfflineScm {
    fn full_name(&self) -> String {
        self.full_name.clone()
    }

    async fn find_release_by_tag(&self, _tag: &str) -> Result<Option<Release>, ScmError> {
        Ok(None)
    }

    async fn create_release(&self, _input: &ReleaseInput) -> Result<Release, ScmError> {
        Err(ScmError::NotImplemented(
            "cannot create releases in offline mode".into(),
        ))
    }

    async fn update_release(&self, _id: u64, _input: &ReleaseInput) -> Result<Release, ScmError> {
        Err(ScmError::NotImplemented(
            "cannot update releases in offline mode".into(),
        ))
    }
}

impl ScmClient for OfflineScm {
    fn name(&self) -> &'static str {
        "offline"
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookups_find_nothing() {
        let scm = OfflineScm::new(TrackerKind::Jira, "acme/widget");
        assert_eq!(scm.kind(), TrackerKind::Jira);
        assert!(scm.get_issue("ABC-1").await.unwrap().is_none());
        assert!(scm.find_user_by_email("a@b.c").await.unwrap().is_none());
        assert!(scm.contributors().await.unwrap().is_empty());
        assert!(scm.find_release_by_tag("v1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn writes_are_refused() {
        let scm = OfflineScm::new(TrackerKind::Git, "acme/widget");
        let input = ReleaseInput {
            title: "t".into(),
            tag: "v1".into(),
            description: String::new(),
        };
        assert!(matches!(
            scm.create_release(&input).await,
            Err(ScmError::NotImplemented(_))
        ));
        assert_eq!(scm.full_name(), "acme/widget");
        assert_eq!(scm.name(), "offline");
    }
}
