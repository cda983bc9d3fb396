//! changelog::extract
//!
//! Issue reference extraction from commit messages.
//!
//! The pattern is chosen once per run from the tracker kind:
//!
//! | Kind | Pattern | Example | Identifier |
//! | ---- | ------- | ------- | ---------- |
//! | [`TrackerKind::Git`] | `#\d+` | `fixes #42` | `42` |
//! | [`TrackerKind::Jira`] | `[A-Z][A-Z]+-\d+` | `ABC-123: fix` | `ABC-123` |
//!
//! Extraction never touches the network. Deduplication across commits is
//! the enricher's job; here a message only yields each identifier once.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::types::RawCommit;
use crate::scm::TrackerKind;

fn numeric_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\d+)").expect("numeric issue pattern is valid"))
}

fn project_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Z][A-Z]+-\d+").expect("project key issue pattern is valid")
    })
}

/// The reference syntax used when scanning commit messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuePattern {
    /// `#123`; the `#` is stripped from the identifier
    Numeric,
    /// `ABC-123`; the whole key is the identifier
    ProjectKey,
}

impl IssuePattern {
    /// Select the pattern for a tracker kind.
    pub fn for_kind(kind: TrackerKind) -> Self {
        match kind {
            TrackerKind::Git => IssuePattern::Numeric,
            TrackerKind::Jira => IssuePattern::ProjectKey,
        }
    }

    /// Human-readable name used in the run log.
    pub fn name(&self) -> &'static str {
        match self {
            IssuePattern::Numeric => "git",
            IssuePattern::ProjectKey => "jira",
        }
    }

    /// Extract issue identifiers from message text.
    ///
    /// Identifiers are returned in order of first appearance, each once.
    ///
    /// # Example
    ///
    /// ```
    /// use relnote::changelog::extract::IssuePattern;
    ///
    /// let ids = IssuePattern::Numeric.extract("fix #12, see #3 and #12");
    /// assert_eq!(ids, vec!["12", "3"]);
    ///
    /// let keys = IssuePattern::ProjectKey.extract("ABC-9: done (XY-1)");
    /// assert_eq!(keys, vec!["ABC-9", "XY-1"]);
    /// ```
    pub fn extract(&self, text: &str) -> Vec<String> {
        let found: Vec<&str> = match self {
            IssuePattern::Numeric => numeric_regex()
                .captures_iter(text)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str())
                .collect(),
            IssuePattern::ProjectKey => project_key_regex()
                .find_iter(text)
                .map(|m| m.as_str())
                .collect(),
        };

        let mut ids: Vec<String> = Vec::with_capacity(found.len());
        for id in found {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

/// The text scanned for references in a commit.
///
/// This is the commit's own message; parent messages are not included.
pub fn full_message_text(commit: &RawCommit) -> &str {
    &commit.message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strips_hash() {
        assert_eq!(IssuePattern::Numeric.extract("fixes #42"), vec!["42"]);
    }

    #[test]
    fn numeric_dedups_within_message() {
        let ids = IssuePattern::Numeric.extract("fixes #42\n\ncloses #42, refs #7");
        assert_eq!(ids, vec!["42", "7"]);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(IssuePattern::Numeric.extract("").is_empty());
        assert!(IssuePattern::Numeric.extract("nothing to see # here").is_empty());
        assert!(IssuePattern::ProjectKey.extract("abc-12 lower case").is_empty());
    }

    #[test]
    fn project_key_needs_two_letters() {
        assert!(IssuePattern::ProjectKey.extract("A-1").is_empty());
        assert_eq!(IssuePattern::ProjectKey.extract("AB-1"), vec!["AB-1"]);
    }

    #[test]
    fn project_key_inside_words() {
        assert_eq!(
            IssuePattern::ProjectKey.extract("feature/ABC-123_login"),
            vec!["ABC-123"]
        );
        assert_eq!(IssuePattern::ProjectKey.extract("fixABC-7 done"), vec!["ABC-7"]);
    }

    #[test]
    fn project_key_ignores_numeric_refs() {
        assert_eq!(
            IssuePattern::ProjectKey.extract("PROJ-100 fixes #3"),
            vec!["PROJ-100"]
        );
    }

    #[test]
    fn pattern_selection() {
        assert_eq!(IssuePattern::for_kind(TrackerKind::Git), IssuePattern::Numeric);
        assert_eq!(
            IssuePattern::for_kind(TrackerKind::Jira),
            IssuePattern::ProjectKey
        );
        assert_eq!(IssuePattern::Numeric.name(), "git");
        assert_eq!(IssuePattern::ProjectKey.name(), "jira");
    }
}
