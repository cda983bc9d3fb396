//! changelog::assemble
//!
//! Commit assembly: one [`CommitSummary`] per included commit.
//!
//! For each commit, in source order:
//! - skip merge commits unless configured to include them
//! - resolve author and committer independently
//! - extract issue references and enrich each unique one
//! - attach the identifiers that were enriched
//! - pick up a dependency bump described by the message, if any
//!
//! Nothing here fails: enrichment and resolution problems are logged by the
//! layers below and the commit is still recorded.

use super::deps::parse_dependency_update;
use super::enrich::IssueEnricher;
use super::extract::{full_message_text, IssuePattern};
use super::users::UserResolver;
use crate::core::types::{
    CanonicalUser, CommitSummary, DependencyUpdate, IssueSummary, RawCommit, UserIdentity,
};
use crate::scm::{IssueTracker, UserDirectory};

/// Settings for commit assembly.
#[derive(Debug, Clone, Default)]
pub struct AssemblerOptions {
    /// Include commits with more than one parent
    pub include_merge_commits: bool,
    /// Repository web URL; commit URLs are `<url>/commit/<sha>`
    pub https_url: Option<String>,
    /// Branch recorded on each commit
    pub branch: String,
}

/// Everything the assembler accumulated over a run.
#[derive(Debug, Clone, Default)]
pub struct AssembledCommits {
    /// Commit summaries in source order
    pub commits: Vec<CommitSummary>,
    /// Enriched issues, in discovery order
    pub issues: Vec<IssueSummary>,
    /// Enriched pull requests, in discovery order
    pub pull_requests: Vec<IssueSummary>,
    /// Dependency bumps found in commit messages (not yet collapsed)
    pub dependency_updates: Vec<DependencyUpdate>,
}

/// Builds commit summaries for one run.
///
/// Owns the run-scoped state: the issue de-dup set and the user cache.
pub struct CommitAssembler<'a> {
    pattern: IssuePattern,
    users: UserResolver<'a>,
    enricher: IssueEnricher<'a>,
    options: AssemblerOptions,
    commits: Vec<CommitSummary>,
    dependency_updates: Vec<DependencyUpdate>,
}

impl<'a> CommitAssembler<'a> {
    /// Create an assembler. The issue pattern is chosen here, once.
    pub fn new(
        tracker: &'a dyn IssueTracker,
        directory: &'a dyn UserDirectory,
        options: AssemblerOptions,
    ) -> Self {
        let pattern = IssuePattern::for_kind(tracker.kind());
        tracing::info!(
            "Finding issues in commit messages using {} format",
            pattern.name()
        );

        Self {
            pattern,
            users: UserResolver::new(directory, tracker.home_url()),
            enricher: IssueEnricher::new(tracker),
            options,
            commits: Vec::new(),
            dependency_updates: Vec::new(),
        }
    }

    /// Whether a commit is included under the current settings.
    pub fn includes(&self, commit: &RawCommit) -> bool {
        self.options.include_merge_commits || !commit.is_merge()
    }

    /// Assemble one commit. Returns whether it was included.
    pub async fn add_commit(&mut self, commit: &RawCommit) -> bool {
        if !self.includes(commit) {
            tracing::debug!(sha = %commit.sha, "skipping merge commit");
            return false;
        }

        let author = self.resolve(&commit.author).await;
        let committer = self.resolve(&commit.committer).await;

        let mut issue_ids = Vec::new();
        for id in self.pattern.extract(full_message_text(commit)) {
            if self.enricher.enrich(&id, &mut self.users).await {
                issue_ids.push(id);
            }
        }

        if let Some(update) = parse_dependency_update(&commit.message) {
            tracing::debug!(
                sha = %commit.sha,
                dependency = %format!("{}/{}", update.owner, update.repo),
                "found dependency update"
            );
            self.dependency_updates.push(update);
        }

        let url = self
            .options
            .https_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| format!("{}/commit/{}", u.trim_end_matches('/'), commit.sha))
            .unwrap_or_default();

        self.commits.push(CommitSummary {
            sha: commit.sha.clone(),
            message: commit.message.clone(),
            url,
            branch: self.options.branch.clone(),
            author,
            committer,
            issue_ids,
        });
        true
    }

    /// Assemble every commit in order.
    pub async fn add_all(&mut self, commits: &[RawCommit]) {
        for commit in commits {
            self.add_commit(commit).await;
        }
    }

    /// Resolve an identity, falling back to the raw name/email.
    async fn resolve(&mut self, identity: &UserIdentity) -> Option<CanonicalUser> {
        if !identity.is_complete() {
            return None;
        }
        Some(
            self.users
                .resolve(identity)
                .await
                .unwrap_or_else(|| CanonicalUser::from_identity(identity)),
        )
    }

    /// Finish the run and hand back the accumulated data.
    pub fn finish(self) -> AssembledCommits {
        let (issues, pull_requests) = self.enricher.into_parts();
        AssembledCommits {
            commits: self.commits,
            issues,
            pull_requests,
            dependency_updates: self.dependency_updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scm::mock::{FailOn, MockScm};
    use crate::scm::{Issue, ScmError, TrackerKind};
    use chrono::DateTime;

    fn commit(sha: &str, message: &str, parents: usize) -> RawCommit {
        RawCommit {
            sha: sha.into(),
            message: message.into(),
            author: UserIdentity::new("Jane Doe", "jane@example.com"),
            committer: UserIdentity::new("Bot", "bot@example.com"),
            timestamp: DateTime::UNIX_EPOCH,
            parent_count: parents,
        }
    }

    fn options() -> AssemblerOptions {
        AssemblerOptions {
            include_merge_commits: false,
            https_url: Some("https://github.com/acme/widget".into()),
            branch: "main".into(),
        }
    }

    #[tokio::test]
    async fn skips_merges_by_default() {
        let scm = MockScm::new();
        let mut assembler = CommitAssembler::new(&scm, &scm, options());
        assembler
            .add_all(&[commit("a", "one", 1), commit("b", "merge", 2), commit("c", "root", 0)])
            .await;
        let out = assembler.finish();
        let shas: Vec<_> = out.commits.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn includes_merges_when_enabled() {
        let scm = MockScm::new();
        let mut opts = options();
        opts.include_merge_commits = true;
        let mut assembler = CommitAssembler::new(&scm, &scm, opts);
        assert!(assembler.add_commit(&commit("b", "merge", 2)).await);
        assert_eq!(assembler.finish().commits.len(), 1);
    }

    #[tokio::test]
    async fn shared_reference_is_fetched_once() {
        let scm = MockScm::new().with_issue(
            "42",
            Issue {
                title: "Crash".into(),
                ..Default::default()
            },
        );
        let mut assembler = CommitAssembler::new(&scm, &scm, options());
        assembler
            .add_all(&[commit("a", "fixes #42", 1), commit("b", "also fixes #42", 1)])
            .await;

        let out = assembler.finish();
        assert_eq!(scm.issue_lookups("42"), 1);
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.commits[0].issue_ids, vec!["42"]);
        assert_eq!(out.commits[1].issue_ids, vec!["42"]);
    }

    #[tokio::test]
    async fn failed_lookup_does_not_stop_assembly() {
        let scm = MockScm::new()
            .with_issue("2", Issue::default())
            .fail_on(FailOn::GetIssue {
                id: Some("1".into()),
                error: ScmError::NetworkError("boom".into()),
            });
        let mut assembler = CommitAssembler::new(&scm, &scm, options());
        assembler
            .add_all(&[commit("a", "refs #1 and #2", 1), commit("b", "plain", 1)])
            .await;

        let out = assembler.finish();
        assert_eq!(out.commits.len(), 2);
        assert_eq!(out.commits[0].issue_ids, vec!["2"]);
        assert_eq!(out.issues.len(), 1);
    }

    #[tokio::test]
    async fn unresolved_users_fall_back_to_raw_identity() {
        let scm = MockScm::new();
        let mut assembler = CommitAssembler::new(&scm, &scm, options());
        let mut raw = commit("a", "x", 1);
        raw.committer = UserIdentity::new("", "");
        assembler.add_commit(&raw).await;

        let out = assembler.finish();
        let author = out.commits[0].author.as_ref().unwrap();
        assert_eq!(author.name, "Jane Doe");
        assert!(author.login.is_none());
        assert!(out.commits[0].committer.is_none());
    }

    #[tokio::test]
    async fn commit_url_branch_and_dependency_updates() {
        let scm = MockScm::new();
        let mut assembler = CommitAssembler::new(&scm, &scm, options());
        assembler
            .add_commit(&commit(
                "abc123",
                "chore(deps): bump acme/lib from 1.0.0 to 1.1.0",
                1,
            ))
            .await;

        let out = assembler.finish();
        assert_eq!(
            out.commits[0].url,
            "https://github.com/acme/widget/commit/abc123"
        );
        assert_eq!(out.commits[0].branch, "main");
        assert_eq!(out.dependency_updates.len(), 1);
        assert_eq!(out.dependency_updates[0].repo, "lib");
    }

    #[tokio::test]
    async fn project_key_tracker() {
        let scm = MockScm::new()
            .with_kind(TrackerKind::Jira)
            .with_issue("ABC-1", Issue::default());
        let mut assembler = CommitAssembler::new(&scm, &scm, options());
        assembler.add_commit(&commit("a", "ABC-1 fix #3", 1)).await;

        let out = assembler.finish();
        assert_eq!(out.commits[0].issue_ids, vec!["ABC-1"]);
        assert_eq!(scm.issue_lookups("3"), 0);
    }
}
