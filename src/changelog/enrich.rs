//! changelog::enrich
//!
//! Issue enrichment with run-scoped de-duplication.
//!
//! Each identifier is sent to the tracker at most once per run. The outcome
//! is remembered: a later reference to an enriched identifier is attached
//! without another lookup, and a reference to one that failed or was not
//! found is skipped without another lookup.

use std::collections::HashMap;

use super::users::UserResolver;
use crate::core::types::IssueSummary;
use crate::scm::{Issue, IssueTracker};

/// Looks up referenced issues and accumulates their summaries.
pub struct IssueEnricher<'a> {
    tracker: &'a dyn IssueTracker,
    /// Identifier -> whether it was enriched.
    seen: HashMap<String, bool>,
    issues: Vec<IssueSummary>,
    pull_requests: Vec<IssueSummary>,
}

impl<'a> IssueEnricher<'a> {
    /// Create an enricher for one run.
    pub fn new(tracker: &'a dyn IssueTracker) -> Self {
        Self {
            tracker,
            seen: HashMap::new(),
            issues: Vec::new(),
            pull_requests: Vec::new(),
        }
    }

    /// Enrich an identifier, querying the tracker only the first time.
    ///
    /// Returns whether a summary exists for the identifier. Failures are
    /// logged and yield `false`; they never abort the run.
    pub async fn enrich(&mut self, id: &str, users: &mut UserResolver<'_>) -> bool {
        if let Some(&enriched) = self.seen.get(id) {
            return enriched;
        }

        let enriched = match self.tracker.get_issue(id).await {
            Ok(Some(issue)) => {
                let summary = summarize(id, issue, users).await;
                if summary.pull_request {
                    self.pull_requests.push(summary);
                } else {
                    self.issues.push(summary);
                }
                true
            }
            Ok(None) => {
                tracing::warn!(
                    id,
                    tracker = %self.tracker.home_url(),
                    "issue not found in tracker"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    id,
                    tracker = %self.tracker.home_url(),
                    "failed to look up issue: {}",
                    e
                );
                false
            }
        };

        self.seen.insert(id.to_string(), enriched);
        enriched
    }

    /// Number of distinct identifiers sent to the tracker.
    pub fn lookups(&self) -> usize {
        self.seen.len()
    }

    /// Enriched issues and pull requests, in discovery order.
    pub fn into_parts(self) -> (Vec<IssueSummary>, Vec<IssueSummary>) {
        (self.issues, self.pull_requests)
    }
}

/// Build a summary, resolving every participant independently.
async fn summarize(id: &str, issue: Issue, users: &mut UserResolver<'_>) -> IssueSummary {
    let user = match &issue.author {
        Some(author) => users.resolve_tracker_user(author).await,
        None => None,
    };
    let closed_by = match &issue.closed_by {
        Some(closer) => users.resolve_tracker_user(closer).await,
        None => None,
    };

    let mut assignees = Vec::new();
    for assignee in issue.assignees.iter().flatten() {
        if let Some(resolved) = users.resolve_tracker_user(assignee).await {
            assignees.push(resolved);
        }
    }

    IssueSummary {
        id: id.to_string(),
        url: issue.url,
        title: issue.title,
        body: issue.body,
        state: issue.state,
        creation_timestamp: issue.created_at,
        user,
        closed_by,
        assignees,
        labels: issue.labels,
        pull_request: issue.pull_request,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scm::mock::{FailOn, MockScm};
    use crate::scm::{ScmError, TrackerUser};

    fn issue(title: &str, pull_request: bool) -> Issue {
        Issue {
            url: format!("https://github.com/mock/repo/issues/{}", title),
            title: title.to_string(),
            state: "closed".into(),
            author: Some(TrackerUser::new("alice")),
            assignees: Some(vec![TrackerUser::new("bob"), TrackerUser::new("carol")]),
            pull_request,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn queries_each_id_once() {
        let scm = MockScm::new().with_issue("42", issue("crash", false));
        let mut users = UserResolver::new(&scm, "");
        let mut enricher = IssueEnricher::new(&scm);

        assert!(enricher.enrich("42", &mut users).await);
        assert!(enricher.enrich("42", &mut users).await);
        assert_eq!(scm.issue_lookups("42"), 1);

        let (issues, prs) = enricher.into_parts();
        assert_eq!(issues.len(), 1);
        assert!(prs.is_empty());
        assert_eq!(issues[0].user.as_ref().unwrap().display_name(), "alice");
        assert_eq!(issues[0].assignees.len(), 2);
    }

    #[tokio::test]
    async fn routes_pull_requests() {
        let scm = MockScm::new()
            .with_issue("1", issue("bug", false))
            .with_issue("2", issue("feature", true));
        let mut users = UserResolver::new(&scm, "");
        let mut enricher = IssueEnricher::new(&scm);

        enricher.enrich("2", &mut users).await;
        enricher.enrich("1", &mut users).await;

        let (issues, prs) = enricher.into_parts();
        assert_eq!(issues[0].id, "1");
        assert_eq!(prs[0].id, "2");
        assert!(prs[0].pull_request);
    }

    #[tokio::test]
    async fn failure_is_remembered_and_not_retried() {
        let scm = MockScm::new()
            .with_issue("5", issue("x", false))
            .fail_on(FailOn::GetIssue {
                id: Some("5".into()),
                error: ScmError::NetworkError("reset".into()),
            });
        let mut users = UserResolver::new(&scm, "");
        let mut enricher = IssueEnricher::new(&scm);

        assert!(!enricher.enrich("5", &mut users).await);
        scm.clear_fail_on();
        assert!(!enricher.enrich("5", &mut users).await);
        assert_eq!(scm.issue_lookups("5"), 1);
        assert_eq!(enricher.lookups(), 1);
    }

    #[tokio::test]
    async fn not_found_is_skipped() {
        let scm = MockScm::new();
        let mut users = UserResolver::new(&scm, "");
        let mut enricher = IssueEnricher::new(&scm);

        assert!(!enricher.enrich("404", &mut users).await);
        let (issues, prs) = enricher.into_parts();
        assert!(issues.is_empty() && prs.is_empty());
    }

    #[tokio::test]
    async fn participant_failure_leaves_field_empty() {
        let scm = MockScm::new()
            .with_issue("9", issue("y", false))
            .fail_on(FailOn::FindUserByLogin(ScmError::RateLimited));
        let mut users = UserResolver::new(&scm, "");
        let mut enricher = IssueEnricher::new(&scm);

        assert!(enricher.enrich("9", &mut users).await);
        let (issues, _) = enricher.into_parts();
        assert!(issues[0].user.is_none());
        assert!(issues[0].assignees.is_empty());
        assert_eq!(issues[0].title, "y");
    }
}
