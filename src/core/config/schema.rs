//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$RELNOTE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/relnote/config.toml`
//! 3. `~/.relnote/config.toml`
//!
//! # Repo Config
//!
//! Located at `.relnote.toml` in the work tree root.
//!
//! # Validation
//!
//! Config values are validated after parsing (tracker names, non-empty
//! file names, URL schemes).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::scm::TrackerKind;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// api_base = "https://github.example.com/api/v3"
/// token_env = "GHE_TOKEN"
/// tracker = "jira"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// REST API base for GitHub Enterprise
    pub api_base: Option<String>,

    /// Name of the environment variable holding the API token
    pub token_env: Option<String>,

    /// Issue reference syntax override ("git" or "jira")
    pub tracker: Option<String>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(api_base) = &self.api_base {
            if !api_base.starts_with("https://") && !api_base.starts_with("http://") {
                return Err(ConfigError::InvalidValue(format!(
                    "api_base must be an http(s) URL, got '{}'",
                    api_base
                )));
            }
        }

        if let Some(token_env) = &self.token_env {
            if token_env.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "token_env cannot be empty".to_string(),
                ));
            }
        }

        if let Some(tracker) = &self.tracker {
            if TrackerKind::parse(tracker).is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid tracker '{}', must be one of: git, jira",
                    tracker
                )));
            }
        }

        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// [changelog]
/// header_file = "docs/release-header.md"
/// generate_crd = true
/// include_merge_commits = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Changelog settings
    pub changelog: Option<ChangelogConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(changelog) = &self.changelog {
            changelog.validate()?;
        }
        Ok(())
    }
}

/// The `[changelog]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ChangelogConfig {
    /// Inline header template
    pub header: Option<String>,
    /// Header template file, relative to the work tree
    pub header_file: Option<String>,
    /// Inline footer template
    pub footer: Option<String>,
    /// Footer template file, relative to the work tree
    pub footer_file: Option<String>,
    /// Directory for generated documents
    pub templates_dir: Option<String>,
    /// Release document file name (default: release.yaml)
    pub release_yaml_file: Option<String>,
    /// Schema document file name (default: release-crd.yaml)
    pub crd_yaml_file: Option<String>,
    /// Write the release document (default: true)
    pub generate_release_yaml: Option<bool>,
    /// Write the schema document (default: false)
    pub generate_crd: Option<bool>,
    /// Replace an existing schema document (default: false)
    pub overwrite_crd: Option<bool>,
    /// Create or update the remote release (default: true)
    pub update_release: Option<bool>,
    /// Include merge commits (default: false)
    pub include_merge_commits: Option<bool>,
    /// Fail when no commits are found (default: false)
    pub fail_if_no_commits: Option<bool>,
    /// Write the markdown to this file
    pub output_markdown: Option<String>,
    /// Branch recorded on commits
    pub branch: Option<String>,
}

impl ChangelogConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let file_names = [
            ("release_yaml_file", &self.release_yaml_file),
            ("crd_yaml_file", &self.crd_yaml_file),
            ("header_file", &self.header_file),
            ("footer_file", &self.footer_file),
            ("output_markdown", &self.output_markdown),
            ("templates_dir", &self.templates_dir),
        ];
        for (key, value) in file_names {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} cannot be empty",
                    key
                )));
            }
        }

        if let Some(branch) = &self.branch {
            if branch.trim().is_empty() || branch.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid branch name '{}'",
                    branch
                )));
            }
        }

        Ok(())
    }
}
