//! changelog::deps
//!
//! Dependency update parsing and collapsing.
//!
//! # Collapsing
//!
//! Updates are sorted by `(owner, repo, component, from, to)` using plain
//! string comparison, then each run sharing `(owner, repo, component)`
//! becomes one record. The merged record keeps the "from" fields of the
//! first record in the run (the smallest from-version) and the "to" fields
//! of the record with the largest to-version. Records differing in owner,
//! repo or component are never merged.
//!
//! ```
//! use relnote::changelog::deps::collapse;
//! use relnote::core::types::DependencyUpdate;
//!
//! let bump = |from: &str, to: &str| DependencyUpdate {
//!     owner: "A".into(),
//!     repo: "R".into(),
//!     component: "C".into(),
//!     from_version: from.into(),
//!     to_version: to.into(),
//!     ..Default::default()
//! };
//!
//! let collapsed = collapse(vec![bump("1.0", "2.0"), bump("0.5", "1.0")]);
//! assert_eq!(collapsed.len(), 1);
//! assert_eq!(collapsed[0].from_version, "0.5");
//! assert_eq!(collapsed[0].to_version, "2.0");
//! ```

use std::sync::OnceLock;

use regex::Regex;

use crate::core::types::DependencyUpdate;

/// Host assumed when a bump message names only `owner/repo`.
pub const DEFAULT_HOST: &str = "github.com";

fn bump_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^chore\(deps\): bump (?:(?P<host>[^/\s]+\.[^/\s]+)/)?(?P<owner>[^/\s]+)/(?P<repo>[^/:\s]+)(?::(?P<component>\S+))? from (?P<from>\S+) to (?P<to>\S+)",
        )
        .expect("dependency bump pattern is valid")
    })
}

/// Parse a dependency bump out of a commit message.
///
/// Recognizes `chore(deps): bump [host/]owner/repo[:component] from X to Y`
/// on any line of the message.
pub fn parse_dependency_update(message: &str) -> Option<DependencyUpdate> {
    let caps = bump_regex().captures(message)?;
    let host = caps
        .name("host")
        .map_or(DEFAULT_HOST, |m| m.as_str())
        .to_string();
    let owner = caps.name("owner")?.as_str().to_string();
    let repo = caps.name("repo")?.as_str().to_string();

    Some(DependencyUpdate {
        url: format!("https://{}/{}/{}", host, owner, repo),
        host,
        owner,
        repo,
        component: caps
            .name("component")
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        from_version: caps.name("from")?.as_str().to_string(),
        to_version: caps.name("to")?.as_str().to_string(),
        ..Default::default()
    })
}

/// Collapse updates sharing `(owner, repo, component)`.
///
/// Output is sorted by `(owner, repo, component)`. Collapsing a collapsed
/// list returns it unchanged.
pub fn collapse(mut updates: Vec<DependencyUpdate>) -> Vec<DependencyUpdate> {
    updates.sort_by(|a, b| {
        (
            &a.owner,
            &a.repo,
            &a.component,
            &a.from_version,
            &a.to_version,
        )
            .cmp(&(
                &b.owner,
                &b.repo,
                &b.component,
                &b.from_version,
                &b.to_version,
            ))
    });

    let mut collapsed: Vec<DependencyUpdate> = Vec::with_capacity(updates.len());
    for update in updates {
        match collapsed.last_mut() {
            Some(current) if current.group_key() == update.group_key() => {
                if update.to_version >= current.to_version {
                    current.to_version = update.to_version;
                    current.to_release_name = update.to_release_name;
                    current.to_release_html_url = update.to_release_html_url;
                }
            }
            _ => collapsed.push(update),
        }
    }
    collapsed
}
