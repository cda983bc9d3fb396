//! changelog::publish
//!
//! Everything that happens to a finished changelog outside the pipeline:
//! picking the tag, creating or updating the remote release, and writing
//! the release document, the schema document and the markdown file.
//!
//! # Failure policy
//!
//! Querying the release store is required; any error other than "not
//! found" aborts the run. Creating or updating the release is best effort:
//! a failure is logged and the run finishes without a remote notes URL.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::record::{ReleaseDocument, RELEASE_SCHEMA_YAML};
use super::ChangelogError;
use crate::core::types::ReleaseRecord;
use crate::git::{GitError, TagLookup};
use crate::scm::{Release, ReleaseInput, ReleaseStore, ScmError};

/// Directory searched for charts when no templates directory is configured.
const CHARTS_DIR: &str = "charts";
const CHART_FILE: &str = "Chart.yaml";

/// Pick the tag a version is released under.
///
/// The plain version wins unless only the `v`-prefixed tag exists.
pub fn resolve_tag_name(version: &str, tags: &dyn TagLookup) -> Result<String, GitError> {
    if version.starts_with('v') {
        return Ok(version.to_string());
    }
    let prefixed = format!("v{}", version);
    if tags.tag_exists(&prefixed)? && !tags.tag_exists(version)? {
        return Ok(prefixed);
    }
    Ok(version.to_string())
}

/// A version without its leading `v`.
pub fn clean_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Create or update the remote release for `tag` and back-fill the notes URL.
///
/// Returns the published release, or `None` if create/update failed.
///
/// # Errors
///
/// `ReleaseQuery` if looking up the existing release fails for a reason
/// other than "not found".
pub async fn publish_release(
    store: &dyn ReleaseStore,
    record: &mut ReleaseRecord,
    tag: &str,
    markdown: &str,
) -> Result<Option<Release>, ChangelogError> {
    let repo = store.full_name();

    let existing = match store.find_release_by_tag(tag).await {
        Ok(release) => release,
        Err(ScmError::NotFound(_)) => None,
        Err(source) => {
            return Err(ChangelogError::ReleaseQuery {
                repo,
                tag: tag.to_string(),
                source,
            })
        }
    };

    let input = ReleaseInput {
        title: record.version.clone(),
        tag: tag.to_string(),
        description: markdown.to_string(),
    };

    let result = match &existing {
        Some(release) => store.update_release(release.id, &input).await,
        None => store.create_release(&input).await,
    };

    let release = match result {
        Ok(release) => release,
        Err(e) => {
            tracing::warn!(
                "failed to {} release on repo {} for tag {}: {}",
                if existing.is_some() { "update" } else { "create" },
                repo,
                tag,
                e
            );
            return Ok(None);
        }
    };

    record.release_notes_url = if release.link.is_empty() {
        notes_url_fallback(&record.repository.https_url, tag)
    } else {
        release.link.clone()
    };
    tracing::info!("Updated the release information at {}", record.release_notes_url);

    Ok(Some(release))
}

fn notes_url_fallback(https_url: &str, tag: &str) -> String {
    format!("{}/releases/tag/{}", https_url.trim_end_matches('/'), tag)
}

/// Write the release document for `record` to `path`.
pub fn write_release_document(
    path: &Path,
    record: &ReleaseRecord,
    created: DateTime<Utc>,
) -> Result<ReleaseDocument, ChangelogError> {
    let document = ReleaseDocument::new(record.clone(), created);
    let yaml = document.to_yaml()?;
    write_file(path, &yaml)?;
    tracing::info!("generated: {}", path.display());
    Ok(document)
}

/// Write the schema document unless it exists and `overwrite` is false.
///
/// Returns the path if a file was written.
pub fn write_schema(path: &Path, overwrite: bool) -> Result<Option<PathBuf>, ChangelogError> {
    if path.exists() && !overwrite {
        tracing::debug!("keeping existing schema file {}", path.display());
        return Ok(None);
    }
    write_file(path, RELEASE_SCHEMA_YAML)?;
    tracing::info!("generated: {}", path.display());
    Ok(Some(path.to_path_buf()))
}

/// Write the rendered markdown.
pub fn write_markdown(path: &Path, markdown: &str) -> Result<(), ChangelogError> {
    write_file(path, markdown)?;
    tracing::info!("generated: {}", path.display());
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), ChangelogError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ChangelogError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| ChangelogError::io(path, e))
}

/// Name and version read from a chart's `Chart.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChartInfo {
    /// Chart name
    #[serde(default)]
    pub name: String,
    /// Chart version
    #[serde(default)]
    pub version: String,
}

impl ChartInfo {
    /// Read `Chart.yaml` from a chart directory.
    pub fn load(chart_dir: &Path) -> Result<Self, ChangelogError> {
        let path = chart_dir.join(CHART_FILE);
        let text = fs::read_to_string(&path).map_err(|e| ChangelogError::io(&path, e))?;
        Ok(serde_yaml::from_str(&text)?)
    }
}

/// The first chart directory under `<work_dir>/charts`, by name.
pub fn find_chart_dir(work_dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(work_dir.join(CHARTS_DIR)).ok()?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.join(CHART_FILE).is_file())
        .collect();
    dirs.sort();
    dirs.into_iter().next()
}

/// The `templates` directory of the first chart, created if missing.
///
/// # Errors
///
/// `TemplatesDirNotFound` if the work tree has no chart.
pub fn find_templates_dir(work_dir: &Path) -> Result<PathBuf, ChangelogError> {
    let chart = find_chart_dir(work_dir)
        .ok_or_else(|| ChangelogError::TemplatesDirNotFound(work_dir.to_path_buf()))?;
    let templates = chart.join("templates");
    fs::create_dir_all(&templates).map_err(|e| ChangelogError::io(&templates, e))?;
    Ok(templates)
}
