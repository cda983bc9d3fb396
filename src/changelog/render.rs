//! changelog::render
//!
//! Markdown rendering of a release record.
//!
//! # Layout
//!
//! Commits are grouped by conventional-commit type, in a fixed order, under
//! one `###` heading per non-empty group. Issues, pull requests and
//! dependency updates follow in their own sections. A record with nothing
//! in it renders as the empty string.
//!
//! Header and footer templates are applied by [`compose`]; see
//! [`template`](super::template) for the template language.

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::types::{CommitSummary, IssueSummary, ReleaseRecord};

/// Commit groups in rendering order: (type, heading).
const GROUPS: &[(&str, &str)] = &[
    ("feat", "New Features"),
    ("fix", "Bug Fixes"),
    ("perf", "Performance Improvements"),
    ("refactor", "Code Refactoring"),
    ("docs", "Documentation"),
    ("test", "Tests"),
    ("revert", "Reverts"),
    ("style", "Styles"),
    ("chore", "Chores"),
];

const OTHER_HEADING: &str = "Other Changes";

fn conventional_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<kind>[A-Za-z]+)(?:\((?P<scope>[^)]*)\))?!?:\s*(?P<summary>.+)$")
            .expect("conventional commit pattern is valid")
    })
}

/// A commit subject split into its conventional-commit parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit<'a> {
    /// Lower-cased type (`feat`, `fix`, ...); empty if the subject is free-form
    pub kind: String,
    /// Scope, if any
    pub scope: Option<&'a str>,
    /// Summary text
    pub summary: &'a str,
}

impl<'a> ConventionalCommit<'a> {
    /// Parse a subject line.
    ///
    /// Free-form subjects parse with an empty kind and the whole subject as
    /// the summary.
    pub fn parse(subject: &'a str) -> Self {
        match conventional_regex().captures(subject) {
            Some(caps) => Self {
                kind: caps
                    .name("kind")
                    .map(|m| m.as_str().to_lowercase())
                    .unwrap_or_default(),
                scope: caps
                    .name("scope")
                    .map(|m| m.as_str().trim())
                    .filter(|s| !s.is_empty()),
                summary: caps.name("summary").map_or(subject, |m| m.as_str().trim()),
            },
            None => Self {
                kind: String::new(),
                scope: None,
                summary: subject.trim(),
            },
        }
    }

    /// Heading of the group this commit belongs to.
    pub fn heading(&self) -> &'static str {
        GROUPS
            .iter()
            .find(|(kind, _)| *kind == self.kind)
            .map_or(OTHER_HEADING, |&(_, heading)| heading)
    }
}

/// Render the markdown body for a record.
pub fn render(record: &ReleaseRecord) -> String {
    let mut sections: Vec<String> = Vec::new();

    let headings = GROUPS
        .iter()
        .map(|(_, heading)| *heading)
        .chain(std::iter::once(OTHER_HEADING));
    for heading in headings {
        let lines: Vec<String> = record
            .commits
            .iter()
            .filter(|c| ConventionalCommit::parse(c.subject()).heading() == heading)
            .map(|c| commit_line(c, record))
            .collect();
        if !lines.is_empty() {
            sections.push(section(heading, &lines));
        }
    }

    if !record.issues.is_empty() {
        let lines: Vec<String> = record.issues.iter().map(issue_line).collect();
        sections.push(section("Issues", &lines));
    }

    if !record.pull_requests.is_empty() {
        let lines: Vec<String> = record.pull_requests.iter().map(issue_line).collect();
        sections.push(section("Pull Requests", &lines));
    }

    if !record.dependency_updates.is_empty() {
        sections.push(dependency_table(record));
    }

    sections.join("\n")
}

/// Join header, body and footer.
pub fn compose(header: &str, body: &str, footer: &str) -> String {
    let mut out = String::with_capacity(header.len() + body.len() + footer.len());
    out.push_str(header);
    out.push_str(body);
    out.push_str(footer);
    out
}

fn section(heading: &str, lines: &[String]) -> String {
    let mut out = format!("### {}\n\n", heading);
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn commit_line(commit: &CommitSummary, record: &ReleaseRecord) -> String {
    let parsed = ConventionalCommit::parse(commit.subject());
    let mut line = String::from("* ");

    if let Some(scope) = parsed.scope {
        let _ = write!(line, "**{}:** ", scope);
    }
    line.push_str(parsed.summary);

    let short = commit.sha.get(..7).unwrap_or(&commit.sha);
    if !commit.url.is_empty() {
        let _ = write!(line, " ([{}]({}))", short, commit.url);
    }

    if let Some(author) = &commit.author {
        let _ = write!(line, " ({})", author.display_name());
    }

    if !commit.issue_ids.is_empty() {
        let links: Vec<String> = commit
            .issue_ids
            .iter()
            .map(|id| match record.find_issue(id) {
                Some(issue) if !issue.url.is_empty() => {
                    format!("[{}]({})", reference_text(id), issue.url)
                }
                _ => reference_text(id),
            })
            .collect();
        let _ = write!(line, " fixes {}", links.join(", "));
    }

    line
}

fn issue_line(issue: &IssueSummary) -> String {
    let mut line = if issue.url.is_empty() {
        format!("* {} {}", reference_text(&issue.id), issue.title)
    } else {
        format!(
            "* [{}]({}) {}",
            reference_text(&issue.id),
            issue.url,
            issue.title
        )
    };
    if let Some(user) = &issue.user {
        let _ = write!(line, " ({})", user.display_name());
    }
    line
}

/// `#42` for numeric identifiers, the key itself otherwise.
fn reference_text(id: &str) -> String {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        format!("#{}", id)
    } else {
        id.to_string()
    }
}

fn link_or_text(text: &str, url: Option<&str>) -> String {
    match url {
        Some(url) if !url.is_empty() => format!("[{}]({})", text, url),
        _ => text.to_string(),
    }
}

fn dependency_table(record: &ReleaseRecord) -> String {
    let mut out = String::from("### Dependency Updates\n\n");
    out.push_str("| Dependency | Component | New Version | Old Version |\n");
    out.push_str("| ---------- | --------- | ----------- | ----------- |\n");
    for update in &record.dependency_updates {
        let name = format!("{}/{}", update.owner, update.repo);
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            link_or_text(&name, Some(update.url.as_str())),
            update.component,
            link_or_text(&update.to_version, update.to_release_html_url.as_deref()),
            link_or_text(&update.from_version, update.from_release_html_url.as_deref()),
        );
    }
    out
}
