//! changelog::activity
//!
//! Pipeline activity records.
//!
//! # Architecture
//!
//! A CI build that releases something keeps an activity record keyed by
//! pipeline (`owner/repo/branch`) and build number. After a changelog run
//! the record picks up the last commit, the release notes URL and the
//! version. Fields are only overwritten with non-empty, different values,
//! and the record is only saved when something changed.
//!
//! [`FileActivityStore`] keeps all records in one YAML file. Other backends
//! implement [`ActivityStore`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::publish::clean_version;
use super::ChangelogError;
use crate::core::types::ReleaseRecord;

/// Environment variables consulted for the build number, in order.
pub const BUILD_NUMBER_ENV: &[&str] = &["BUILD_NUMBER", "BUILD_ID"];

/// Identifies one build of one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityKey {
    /// `owner/repo/branch`
    pub pipeline: String,
    /// Build number
    pub build: String,
}

impl ActivityKey {
    /// Key for a repository branch and build.
    pub fn new(owner: &str, repo: &str, branch: &str, build: impl Into<String>) -> Self {
        Self {
            pipeline: format!("{}/{}/{}", owner, repo, branch),
            build: build.into(),
        }
    }
}

/// The build number: the explicit value, else the first non-empty
/// variable of [`BUILD_NUMBER_ENV`] as read by `env`.
pub fn build_number<F>(explicit: Option<&str>, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(str::to_string)
        .filter(|b| !b.is_empty())
        .or_else(|| {
            BUILD_NUMBER_ENV
                .iter()
                .filter_map(|name| env(name))
                .find(|b| !b.is_empty())
        })
}

/// One pipeline activity record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineActivity {
    /// `owner/repo/branch`
    pub pipeline: String,
    /// Build number
    pub build: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_commit_sha: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_commit_message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_commit_url: String,
    #[serde(
        rename = "releaseNotesURL",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub release_notes_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// Values a changelog run contributes to an activity record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityUpdate {
    pub last_commit_sha: String,
    pub last_commit_message: String,
    pub last_commit_url: String,
    pub release_notes_url: String,
    pub version: String,
}

impl ActivityUpdate {
    /// Values taken from a finished release record.
    pub fn from_record(record: &ReleaseRecord) -> Self {
        let mut update = Self {
            release_notes_url: record.release_notes_url.clone(),
            version: clean_version(&record.version).to_string(),
            ..Default::default()
        };
        if let Some(commit) = record.last_commit() {
            update.last_commit_sha = commit.sha.clone();
            update.last_commit_message = commit.message.clone();
            update.last_commit_url = commit.url.clone();
        }
        update
    }
}

impl PipelineActivity {
    /// An empty record for `key`.
    pub fn new(key: &ActivityKey) -> Self {
        Self {
            pipeline: key.pipeline.clone(),
            build: key.build.clone(),
            ..Default::default()
        }
    }

    /// The key of this record.
    pub fn key(&self) -> ActivityKey {
        ActivityKey {
            pipeline: self.pipeline.clone(),
            build: self.build.clone(),
        }
    }

    /// Apply an update. Returns true if any field changed.
    pub fn apply(&mut self, update: &ActivityUpdate) -> bool {
        let mut changed = false;
        changed |= set_if_changed(&mut self.last_commit_sha, &update.last_commit_sha);
        changed |= set_if_changed(&mut self.last_commit_message, &update.last_commit_message);
        changed |= set_if_changed(&mut self.last_commit_url, &update.last_commit_url);
        changed |= set_if_changed(&mut self.release_notes_url, &update.release_notes_url);
        changed |= set_if_changed(&mut self.version, &update.version);
        changed
    }
}

fn set_if_changed(field: &mut String, value: &str) -> bool {
    if value.is_empty() || field == value {
        return false;
    }
    *field = value.to_string();
    true
}

/// Storage for activity records.
pub trait ActivityStore {
    /// Load the record for `key`, if any.
    fn load(&self, key: &ActivityKey) -> Result<Option<PipelineActivity>, ChangelogError>;

    /// Insert or replace a record.
    fn save(&self, activity: &PipelineActivity) -> Result<(), ChangelogError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ActivityFile {
    #[serde(default)]
    activities: Vec<PipelineActivity>,
}

/// Activity records kept in a single YAML file.
#[derive(Debug, Clone)]
pub struct FileActivityStore {
    path: PathBuf,
}

impl FileActivityStore {
    /// A store backed by `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<ActivityFile, ChangelogError> {
        if !self.path.exists() {
            return Ok(ActivityFile::default());
        }
        let text =
            fs::read_to_string(&self.path).map_err(|e| ChangelogError::io(&self.path, e))?;
        if text.trim().is_empty() {
            return Ok(ActivityFile::default());
        }
        Ok(serde_yaml::from_str(&text)?)
    }
}

impl ActivityStore for FileActivityStore {
    fn load(&self, key: &ActivityKey) -> Result<Option<PipelineActivity>, ChangelogError> {
        Ok(self
            .read()?
            .activities
            .into_iter()
            .find(|a| a.pipeline == key.pipeline && a.build == key.build))
    }

    fn save(&self, activity: &PipelineActivity) -> Result<(), ChangelogError> {
        let mut file = self.read()?;
        match file
            .activities
            .iter_mut()
            .find(|a| a.pipeline == activity.pipeline && a.build == activity.build)
        {
            Some(existing) => *existing = activity.clone(),
            None => file.activities.push(activity.clone()),
        }

        let yaml = serde_yaml::to_string(&file)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ChangelogError::io(parent, e))?;
        }
        fs::write(&self.path, yaml).map_err(|e| ChangelogError::io(&self.path, e))
    }
}

/// Apply `update` to the record for `key` and save it if it changed.
///
/// Without a key (no build number) a warning is logged and nothing is
/// written. Returns true if the record was saved.
pub fn record_activity(
    store: &dyn ActivityStore,
    key: Option<&ActivityKey>,
    update: &ActivityUpdate,
) -> Result<bool, ChangelogError> {
    let Some(key) = key else {
        tracing::warn!("no build number available, not updating the pipeline activity");
        return Ok(false);
    };

    let mut activity = store
        .load(key)?
        .unwrap_or_else(|| PipelineActivity::new(key));

    if !activity.apply(update) {
        tracing::debug!(pipeline = %key.pipeline, build = %key.build, "activity unchanged");
        return Ok(false);
    }

    store.save(&activity)?;
    tracing::info!(
        pipeline = %key.pipeline,
        build = %key.build,
        "updated pipeline activity"
    );
    Ok(true)
}
