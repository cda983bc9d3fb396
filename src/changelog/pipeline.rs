//! changelog::pipeline
//!
//! A full changelog run: commits in, release record and markdown out.
//!
//! Side effects (publishing, files, activity records) are left to
//! [`publish`](super::publish) and [`activity`](super::activity), so this
//! stage can run against in-memory collaborators.

use super::assemble::{AssemblerOptions, CommitAssembler};
use super::record::ReleaseRecordBuilder;
use super::render::{compose, render};
use super::template::render_template;
use super::ChangelogError;
use crate::core::types::{DependencyUpdate, RawCommit, ReleaseRecord, RepositoryInfo};
use crate::git::CommitSource;
use crate::scm::{IssueTracker, UserDirectory};

/// Prefix of the commit that cut the previous release.
const RELEASE_COMMIT_PREFIX: &str = "release ";

/// Inputs of a changelog run.
#[derive(Debug, Clone, Default)]
pub struct ChangelogOptions {
    /// Application name
    pub name: String,
    /// Version being released
    pub version: String,
    /// Exclusive lower revision
    pub previous_rev: String,
    /// Inclusive upper revision
    pub current_rev: String,
    /// Repository metadata
    pub repository: RepositoryInfo,
    /// Branch recorded on commits
    pub branch: String,
    /// Include commits with more than one parent
    pub include_merge_commits: bool,
    /// Treat an empty or unreadable commit range as fatal
    pub fail_if_no_commits: bool,
    /// Header template text
    pub header: String,
    /// Footer template text
    pub footer: String,
    /// Dependency updates supplied by the caller
    pub dependency_updates: Vec<DependencyUpdate>,
}

/// The result of a run.
#[derive(Debug, Clone)]
pub struct Changelog {
    /// The release record
    pub record: ReleaseRecord,
    /// Header + body + footer
    pub markdown: String,
}

/// Run the pipeline.
///
/// # Errors
///
/// - `Git` if the commits cannot be read and `fail_if_no_commits` is set
/// - `NoCommits` if the range is empty and `fail_if_no_commits` is set
/// - `Template` if the header or footer cannot be rendered
///
/// Issue and user lookup failures are logged and never returned.
pub async fn generate(
    source: &dyn CommitSource,
    tracker: &dyn IssueTracker,
    users: &dyn UserDirectory,
    options: &ChangelogOptions,
) -> Result<Changelog, ChangelogError> {
    let commits = fetch_commits(source, options)?;

    let mut assembler = CommitAssembler::new(
        tracker,
        users,
        AssemblerOptions {
            include_merge_commits: options.include_merge_commits,
            https_url: Some(options.repository.https_url.clone()),
            branch: options.branch.clone(),
        },
    );
    assembler.add_all(&commits).await;
    let assembled = assembler.finish();

    tracing::info!(
        commits = assembled.commits.len(),
        issues = assembled.issues.len(),
        pull_requests = assembled.pull_requests.len(),
        "assembled changelog"
    );

    let record = ReleaseRecordBuilder::new(&options.name, &options.version)
        .repository(options.repository.clone())
        .dependency_updates(options.dependency_updates.clone())
        .build(assembled);

    let markdown = render_markdown(&record, &options.header, &options.footer)?;
    tracing::debug!("Generated release notes:\n\n{}\n", markdown);

    Ok(Changelog { record, markdown })
}

/// Render the body and wrap it in the header and footer templates.
pub fn render_markdown(
    record: &ReleaseRecord,
    header: &str,
    footer: &str,
) -> Result<String, ChangelogError> {
    let body = render(record);
    let header = render_template("header", header, record)?;
    let footer = render_template("footer", footer, record)?;
    Ok(compose(&header, &body, &footer))
}

fn fetch_commits(
    source: &dyn CommitSource,
    options: &ChangelogOptions,
) -> Result<Vec<RawCommit>, ChangelogError> {
    let from = &options.previous_rev;
    let to = &options.current_rev;

    let mut commits = match source.fetch_commits(from, to) {
        Ok(commits) => commits,
        Err(e) if options.fail_if_no_commits => return Err(e.into()),
        Err(e) => {
            tracing::warn!(
                "failed to find git commits between revision {} and {} due to: {}",
                from,
                to,
                e
            );
            Vec::new()
        }
    };

    if commits
        .first()
        .is_some_and(|c| c.message.starts_with(RELEASE_COMMIT_PREFIX))
    {
        let dropped = commits.remove(0);
        tracing::debug!(sha = %dropped.sha, "dropping release commit");
    }

    for commit in &commits {
        tracing::debug!(
            sha = %commit.sha,
            author = %commit.author,
            date = %commit.timestamp.to_rfc2822(),
            "found commit"
        );
    }

    if commits.is_empty() {
        if options.fail_if_no_commits {
            return Err(ChangelogError::NoCommits {
                from: from.clone(),
                to: to.clone(),
            });
        }
        tracing::warn!("no commits found between {} and {}", from, to);
    }

    Ok(commits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::UserIdentity;
    use crate::git::GitError;
    use crate::scm::mock::MockScm;
    use chrono::DateTime;

    struct FailingSource;

    impl CommitSource for FailingSource {
        fn fetch_commits(&self, _from: &str, to: &str) -> Result<Vec<RawCommit>, GitError> {
            Err(GitError::RevisionNotFound { rev: to.to_string() })
        }
    }

    fn commit(sha: &str, message: &str) -> RawCommit {
        RawCommit {
            sha: sha.into(),
            message: message.into(),
            author: UserIdentity::new("Jane", "jane@example.com"),
            committer: UserIdentity::new("Jane", "jane@example.com"),
            timestamp: DateTime::UNIX_EPOCH,
            parent_count: 1,
        }
    }

    fn options() -> ChangelogOptions {
        ChangelogOptions {
            name: "widget".into(),
            version: "2.0.1".into(),
            previous_rev: "v2.0.0".into(),
            current_rev: "v2.0.1".into(),
            branch: "main".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn drops_leading_release_commit() {
        let scm = MockScm::new();
        let commits = vec![commit("b", "release 2.0.1"), commit("a", "feat: thing")];
        let out = generate(&commits, &scm, &scm, &options()).await.unwrap();
        assert_eq!(out.record.commits.len(), 1);
        assert_eq!(out.record.commits[0].sha, "a");
    }

    #[tokio::test]
    async fn release_commit_only_stripped_when_first() {
        let scm = MockScm::new();
        let commits = vec![commit("b", "feat: thing"), commit("a", "release 2.0.0")];
        let out = generate(&commits, &scm, &scm, &options()).await.unwrap();
        assert_eq!(out.record.commits.len(), 2);
    }

    #[tokio::test]
    async fn header_body_footer() {
        let scm = MockScm::new();
        let mut opts = options();
        opts.header = "H:{{.Version}}\n".into();
        opts.footer = "\n-- {{.Name}}".into();
        let commits = vec![commit("a", "feat: thing")];

        let out = generate(&commits, &scm, &scm, &opts).await.unwrap();
        assert!(out.markdown.starts_with("H:2.0.1\n### New Features\n"));
        assert!(out.markdown.ends_with("\n-- widget"));
    }

    #[tokio::test]
    async fn empty_range_is_a_warning_by_default() {
        let scm = MockScm::new();
        let out = generate(&Vec::<RawCommit>::new(), &scm, &scm, &options())
            .await
            .unwrap();
        assert!(out.record.commits.is_empty());
        assert_eq!(out.markdown, "");
    }

    #[tokio::test]
    async fn empty_range_can_be_fatal() {
        let scm = MockScm::new();
        let mut opts = options();
        opts.fail_if_no_commits = true;
        let result = generate(&Vec::<RawCommit>::new(), &scm, &scm, &opts).await;
        assert!(matches!(result, Err(ChangelogError::NoCommits { .. })));
    }

    #[tokio::test]
    async fn source_errors_follow_the_same_toggle() {
        let scm = MockScm::new();
        assert!(generate(&FailingSource, &scm, &scm, &options()).await.is_ok());

        let mut opts = options();
        opts.fail_if_no_commits = true;
        let result = generate(&FailingSource, &scm, &scm, &opts).await;
        assert!(matches!(result, Err(ChangelogError::Git(_))));
    }

    #[tokio::test]
    async fn template_errors_are_fatal() {
        let scm = MockScm::new();
        let mut opts = options();
        opts.footer = "{{if .Version}}unterminated".into();
        let result = generate(&Vec::<RawCommit>::new(), &scm, &scm, &opts).await;
        assert!(matches!(result, Err(ChangelogError::Template(_))));
    }
}
