//! Integration tests for the Git interface.
//!
//! These tests use real git repositories created via tempfile to verify
//! that tags, range discovery and commit walks work against actual git
//! history.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use relnote::git::{CommitSource, Git, GitError, TagLookup};

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
    /// Seconds added to the base commit date; keeps commit times distinct.
    clock: std::cell::Cell<i64>,
}

impl TestRepo {
    /// Create a new test repository with an initial commit.
    fn new() -> Self {
        let repo = Self::empty();
        repo.commit_file("README.md", "# Test Repo\n", "Initial commit");
        repo
    }

    /// Create a repository with no commits.
    fn empty() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init"], None);
        run_git(dir.path(), &["config", "user.email", "test@example.com"], None);
        run_git(dir.path(), &["config", "user.name", "Test User"], None);
        run_git(dir.path(), &["checkout", "-b", "main"], None);

        Self {
            dir,
            clock: std::cell::Cell::new(0),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    /// Create a file and commit it, returning the new commit SHA.
    fn commit_file(&self, path: &str, content: &str, message: &str) -> String {
        let tick = self.clock.get() + 60;
        self.clock.set(tick);
        let date = format!("{} +0000", 1_700_000_000 + tick);

        std::fs::write(self.path().join(path), content).unwrap();
        run_git(self.path(), &["add", path], None);
        run_git(self.path(), &["commit", "-m", message], Some(&date));
        self.head()
    }

    fn tag(&self, name: &str) {
        run_git(self.path(), &["tag", name], None);
    }

    fn head(&self) -> String {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(self.path())
            .output()
            .expect("git rev-parse failed");
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }
}

/// Run a git command in the given directory, optionally pinning commit dates.
fn run_git(dir: &Path, args: &[&str], date: Option<&str>) {
    let mut command = Command::new("git");
    command.args(args).current_dir(dir);
    if let Some(date) = date {
        command
            .env("GIT_AUTHOR_DATE", date)
            .env("GIT_COMMITTER_DATE", date);
    }
    let output = command.output().expect("failed to run git");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

// =============================================================================
// Opening
// =============================================================================

mod open {
    use super::*;

    #[test]
    fn opens_from_subdirectory() {
        let repo = TestRepo::new();
        let sub = repo.path().join("nested");
        std::fs::create_dir(&sub).unwrap();

        let git = Git::open(&sub).unwrap();
        assert_eq!(
            git.work_dir().unwrap().canonicalize().unwrap(),
            repo.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn not_a_repo() {
        let dir = TempDir::new().unwrap();
        let result = Git::open(dir.path());
        assert!(matches!(result, Err(GitError::NotARepo { .. })));
    }

    #[test]
    fn current_branch_name() {
        let repo = TestRepo::new();
        assert_eq!(repo.git().current_branch().as_deref(), Some("main"));
    }
}

// =============================================================================
// Tags and range discovery
// =============================================================================

mod ranges {
    use super::*;

    #[test]
    fn tags_newest_first() {
        let repo = TestRepo::new();
        repo.tag("v1.0.0");
        repo.commit_file("a.txt", "a", "feat: a");
        repo.tag("v1.1.0");
        let head = repo.commit_file("b.txt", "b", "fix: b");
        repo.tag("v1.1.1");

        let tags = repo.git().tags().unwrap();
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["v1.1.1", "v1.1.0", "v1.0.0"]);
        assert_eq!(tags[0].sha, head);
    }

    #[test]
    fn range_between_two_newest_tags() {
        let repo = TestRepo::new();
        repo.tag("v1.0.0");
        let middle = repo.commit_file("a.txt", "a", "feat: a");
        repo.tag("v1.1.0");
        let newest = repo.commit_file("b.txt", "b", "fix: b");
        repo.tag("v1.2.0");

        let range = repo.git().discover_range(None, None).unwrap().unwrap();
        assert_eq!(range.from, middle);
        assert_eq!(range.to, newest);
    }

    #[test]
    fn range_without_tags_spans_history() {
        let repo = TestRepo::new();
        let root = repo.git().first_commit().unwrap().unwrap();
        repo.commit_file("a.txt", "a", "feat: a");

        let range = repo.git().discover_range(None, None).unwrap().unwrap();
        assert_eq!(range.from, root);
        assert_eq!(range.to, "HEAD");
    }

    #[test]
    fn explicit_revisions_win() {
        let repo = TestRepo::new();
        repo.tag("v1.0.0");

        let range = repo
            .git()
            .discover_range(Some("abc"), Some("def"))
            .unwrap()
            .unwrap();
        assert_eq!(range.from, "abc");
        assert_eq!(range.to, "def");
    }

    #[test]
    fn empty_repository_has_no_range() {
        let repo = TestRepo::empty();
        assert!(repo.git().discover_range(None, None).unwrap().is_none());
    }

    #[test]
    fn tag_lookup() {
        let repo = TestRepo::new();
        repo.tag("v2.0.0");
        let git = repo.git();

        assert!(git.tag_exists("v2.0.0").unwrap());
        assert!(!git.tag_exists("2.0.0").unwrap());
    }
}

// =============================================================================
// Commit walks
// =============================================================================

mod commits {
    use super::*;

    #[test]
    fn newest_first_excluding_lower_bound() {
        let repo = TestRepo::new();
        repo.tag("v1.0.0");
        repo.commit_file("a.txt", "a", "feat: first");
        repo.commit_file("b.txt", "b", "fix: second\n\nfixes #42");

        let commits = repo.git().fetch_commits("v1.0.0", "HEAD").unwrap();

        let subjects: Vec<_> = commits
            .iter()
            .map(|c| c.message.lines().next().unwrap_or(""))
            .collect();
        assert_eq!(subjects, vec!["fix: second", "feat: first"]);
        assert!(commits[0].message.contains("fixes #42"));
        assert_eq!(commits[0].author.name, "Test User");
        assert_eq!(commits[0].author.email, "test@example.com");
        assert_eq!(commits[0].parent_count, 1);
    }

    #[test]
    fn same_revision_is_empty() {
        let repo = TestRepo::new();
        let commits = repo.git().commits_between("HEAD", "HEAD").unwrap();
        assert!(commits.is_empty());
    }

    #[test]
    fn unknown_revision_is_an_error() {
        let repo = TestRepo::new();
        let result = repo.git().commits_between("v9.9.9", "HEAD");
        assert!(matches!(result, Err(GitError::RevisionNotFound { .. })));
    }

    #[test]
    fn resolve_revision_to_sha() {
        let repo = TestRepo::new();
        let head = repo.head();
        assert_eq!(repo.git().resolve_revision("HEAD").unwrap(), head);
    }
}

// =============================================================================
// Remotes and index
// =============================================================================

mod remotes {
    use super::*;

    #[test]
    fn default_remote_prefers_origin() {
        let repo = TestRepo::new();
        run_git(
            repo.path(),
            &["remote", "add", "upstream", "https://github.com/up/widget.git"],
            None,
        );
        run_git(
            repo.path(),
            &["remote", "add", "origin", "git@github.com:acme/widget.git"],
            None,
        );
        let git = repo.git();

        assert_eq!(git.default_remote().unwrap().as_deref(), Some("origin"));
        assert_eq!(
            git.remote_url("origin").unwrap().as_deref(),
            Some("git@github.com:acme/widget.git")
        );
        assert!(git.remote_url("missing").unwrap().is_none());
    }

    #[test]
    fn no_remotes() {
        let repo = TestRepo::new();
        assert!(repo.git().default_remote().unwrap().is_none());
    }

    #[test]
    fn add_path_stages_generated_files() {
        let repo = TestRepo::new();
        let dir = repo.path().join("charts/widget/templates");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("release-crd.yaml"), "kind: Release\n").unwrap();

        repo.git().add_path(&dir).unwrap();

        let output = Command::new("git")
            .args(["diff", "--cached", "--name-only"])
            .current_dir(repo.path())
            .output()
            .unwrap();
        let staged = String::from_utf8(output.stdout).unwrap();
        assert!(staged.contains("charts/widget/templates/release-crd.yaml"));
    }
}
