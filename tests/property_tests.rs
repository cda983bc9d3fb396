//! Property-based tests for dependency collapsing and commit assembly.

use chrono::DateTime;
use proptest::prelude::*;

use relnote::changelog::deps::collapse;
use relnote::changelog::{generate, ChangelogOptions};
use relnote::core::types::{DependencyUpdate, RawCommit, UserIdentity};
use relnote::scm::mock::MockScm;

fn arb_update() -> impl Strategy<Value = DependencyUpdate> {
    (
        prop::sample::select(vec!["acme", "globex"]),
        prop::sample::select(vec!["lib", "cli"]),
        prop::sample::select(vec!["", "core", "web"]),
        "[0-9]\\.[0-9]",
        "[0-9]\\.[0-9]",
    )
        .prop_map(|(owner, repo, component, from, to)| DependencyUpdate {
            owner: owner.to_string(),
            repo: repo.to_string(),
            component: component.to_string(),
            from_version: from,
            to_version: to,
            ..Default::default()
        })
}

fn arb_commit() -> impl Strategy<Value = RawCommit> {
    ("[0-9a-f]{8}", "[a-z ]{1,20}", 0usize..3).prop_map(|(sha, subject, parents)| RawCommit {
        sha,
        message: format!("fix: {}", subject),
        author: UserIdentity::new("Jane Doe", "jane@example.com"),
        committer: UserIdentity::new("Jane Doe", "jane@example.com"),
        timestamp: DateTime::UNIX_EPOCH,
        parent_count: parents,
    })
}

proptest! {
    #[test]
    fn collapse_is_idempotent(updates in prop::collection::vec(arb_update(), 0..20)) {
        let once = collapse(updates);
        let twice = collapse(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn collapse_leaves_one_record_per_group(updates in prop::collection::vec(arb_update(), 0..20)) {
        let collapsed = collapse(updates.clone());

        let mut keys: Vec<_> = collapsed.iter().map(|u| u.group_key()).collect();
        let count = keys.len();
        keys.dedup();
        prop_assert_eq!(keys.len(), count);

        for merged in &collapsed {
            let group: Vec<&DependencyUpdate> = updates
                .iter()
                .filter(|u| u.group_key() == merged.group_key())
                .collect();
            prop_assert!(!group.is_empty());
            let min_from = group.iter().map(|u| u.from_version.as_str()).min();
            let max_to = group.iter().map(|u| u.to_version.as_str()).max();
            prop_assert_eq!(Some(merged.from_version.as_str()), min_from);
            prop_assert_eq!(Some(merged.to_version.as_str()), max_to);
        }
    }

    #[test]
    fn commit_count_follows_merge_setting(
        commits in prop::collection::vec(arb_commit(), 0..12),
        include_merge_commits in any::<bool>(),
    ) {
        let scm = MockScm::new();
        let options = ChangelogOptions {
            include_merge_commits,
            ..Default::default()
        };

        let out = tokio_test::block_on(generate(&commits, &scm, &scm, &options)).unwrap();

        let expected = commits
            .iter()
            .filter(|c| include_merge_commits || c.parent_count <= 1)
            .count();
        prop_assert_eq!(out.record.commits.len(), expected);
    }
}
