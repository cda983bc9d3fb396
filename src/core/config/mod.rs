//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! relnote has two configuration scopes:
//! - **Global**: User-level settings (API endpoint, token, tracker kind)
//! - **Repo**: Changelog settings for one repository
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$RELNOTE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/relnote/config.toml`
//! 3. `~/.relnote/config.toml`
//!
//! # Repo Config Location
//!
//! `.relnote.toml` in the work tree root.
//!
//! # Example
//!
//! ```no_run
//! use relnote::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo"))).unwrap();
//! let config = result.config;
//!
//! println!("Release file: {}", config.release_yaml_file());
//! println!("Update release: {}", config.update_release());
//! ```

pub mod schema;

pub use schema::{ChangelogConfig, GlobalConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::scm::TrackerKind;

/// File name of the repository config.
pub const REPO_CONFIG_FILE: &str = ".relnote.toml";

/// Token variables tried when `token_env` is not configured.
pub const DEFAULT_TOKEN_ENV: &[&str] = &["GITHUB_TOKEN", "GIT_API_TOKEN"];

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to read template file '{path}': {source}")]
    TemplateReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply defaults. Repo settings only exist in the repo scope,
/// so there is nothing to merge between scopes.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Configuration with only a repository scope, not read from disk.
    pub fn with_repo(repo: RepoConfig) -> Self {
        Self {
            repo: Some(repo),
            ..Default::default()
        }
    }

    /// Load configuration from default locations.
    ///
    /// If `repo_path` is provided, also loads repo-specific config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(repo_path: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = Self::load_global()?;

        let (repo, repo_path_found) = match repo_path {
            Some(path) => Self::load_repo(path)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
            if let (Some(changelog), Some(path)) = (&r.changelog, &repo_path_found) {
                Self::check_template_overlap(changelog, path, &mut warnings);
            }
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path,
                repo_path: repo_path_found,
            },
            warnings,
        })
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $RELNOTE_CONFIG
        if let Ok(path) = std::env::var("RELNOTE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. Check $XDG_CONFIG_HOME/relnote/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("relnote/config.toml");
            if path.exists() {
                let config = Self::read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.relnote/config.toml
        if let Ok(path) = Self::global_config_path() {
            if path.exists() {
                let config = Self::read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    /// Load `.relnote.toml` from the work tree root.
    fn load_repo(repo_path: &Path) -> Result<(Option<RepoConfig>, Option<PathBuf>), ConfigError> {
        let path = Self::repo_config_path(repo_path);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = Self::read_toml(&path)?;
        Ok((Some(config), Some(path)))
    }

    fn check_template_overlap(
        changelog: &ChangelogConfig,
        path: &Path,
        warnings: &mut Vec<ConfigWarning>,
    ) {
        let pairs = [
            ("header", &changelog.header, &changelog.header_file),
            ("footer", &changelog.footer, &changelog.footer_file),
        ];
        for (key, inline, file) in pairs {
            if inline.is_some() && file.is_some() {
                warnings.push(ConfigWarning {
                    message: format!("both {0} and {0}_file are set; {0}_file is ignored", key),
                    path: path.to_path_buf(),
                });
            }
        }
    }

    /// Read and parse a TOML config file.
    fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.relnote/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".relnote/config.toml"))
    }

    /// Get the path for repo config.
    pub fn repo_config_path(repo_path: &Path) -> PathBuf {
        repo_path.join(REPO_CONFIG_FILE)
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// GitHub Enterprise API base, if configured.
    pub fn api_base(&self) -> Option<&str> {
        self.global.api_base.as_deref()
    }

    /// Environment variables consulted for the API token, in order.
    pub fn token_env_names(&self) -> Vec<&str> {
        match &self.global.token_env {
            Some(name) => vec![name.as_str()],
            None => DEFAULT_TOKEN_ENV.to_vec(),
        }
    }

    /// The API token from the environment, if any.
    pub fn token(&self) -> Option<String> {
        self.token_env_names()
            .into_iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
    }

    /// Issue reference syntax override.
    pub fn tracker(&self) -> Option<TrackerKind> {
        self.global.tracker.as_deref().and_then(TrackerKind::parse)
    }

    /// The `[changelog]` table, if present.
    pub fn changelog(&self) -> Option<&ChangelogConfig> {
        self.repo.as_ref().and_then(|r| r.changelog.as_ref())
    }

    fn changelog_str(&self, get: impl Fn(&ChangelogConfig) -> Option<&String>) -> Option<&str> {
        self.changelog().and_then(get).map(String::as_str)
    }

    fn changelog_flag(&self, get: impl Fn(&ChangelogConfig) -> Option<bool>, default: bool) -> bool {
        self.changelog().and_then(get).unwrap_or(default)
    }

    /// Directory for generated documents, if configured.
    pub fn templates_dir(&self) -> Option<&str> {
        self.changelog_str(|c| c.templates_dir.as_ref())
    }

    /// Release document file name.
    ///
    /// Defaults to "release.yaml".
    pub fn release_yaml_file(&self) -> &str {
        self.changelog_str(|c| c.release_yaml_file.as_ref())
            .unwrap_or("release.yaml")
    }

    /// Schema document file name.
    ///
    /// Defaults to "release-crd.yaml".
    pub fn crd_yaml_file(&self) -> &str {
        self.changelog_str(|c| c.crd_yaml_file.as_ref())
            .unwrap_or("release-crd.yaml")
    }

    /// Defaults to `true`.
    pub fn generate_release_yaml(&self) -> bool {
        self.changelog_flag(|c| c.generate_release_yaml, true)
    }

    /// Defaults to `false`.
    pub fn generate_crd(&self) -> bool {
        self.changelog_flag(|c| c.generate_crd, false)
    }

    /// Defaults to `false`.
    pub fn overwrite_crd(&self) -> bool {
        self.changelog_flag(|c| c.overwrite_crd, false)
    }

    /// Defaults to `true`.
    pub fn update_release(&self) -> bool {
        self.changelog_flag(|c| c.update_release, true)
    }

    /// Defaults to `false`.
    pub fn include_merge_commits(&self) -> bool {
        self.changelog_flag(|c| c.include_merge_commits, false)
    }

    /// Defaults to `false`.
    pub fn fail_if_no_commits(&self) -> bool {
        self.changelog_flag(|c| c.fail_if_no_commits, false)
    }

    /// Markdown output file, if configured.
    pub fn output_markdown(&self) -> Option<&str> {
        self.changelog_str(|c| c.output_markdown.as_ref())
    }

    /// Configured branch, if any.
    pub fn branch(&self) -> Option<&str> {
        self.changelog_str(|c| c.branch.as_ref())
    }

    /// Header template text: inline, else file contents, else empty.
    ///
    /// Relative file paths resolve against `work_dir`.
    pub fn header_template(&self, work_dir: &Path) -> Result<String, ConfigError> {
        self.template_text(
            work_dir,
            self.changelog_str(|c| c.header.as_ref()),
            self.changelog_str(|c| c.header_file.as_ref()),
        )
    }

    /// Footer template text: inline, else file contents, else empty.
    pub fn footer_template(&self, work_dir: &Path) -> Result<String, ConfigError> {
        self.template_text(
            work_dir,
            self.changelog_str(|c| c.footer.as_ref()),
            self.changelog_str(|c| c.footer_file.as_ref()),
        )
    }

    fn template_text(
        &self,
        work_dir: &Path,
        inline: Option<&str>,
        file: Option<&str>,
    ) -> Result<String, ConfigError> {
        if let Some(text) = inline {
            return Ok(text.to_string());
        }
        match file {
            Some(file) => read_template_file(&work_dir.join(file)),
            None => Ok(String::new()),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

/// Read a template file.
pub fn read_template_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|e| ConfigError::TemplateReadError {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn with_changelog(changelog: ChangelogConfig) -> Config {
        Config::with_repo(RepoConfig {
            changelog: Some(changelog),
        })
    }

    #[test]
    fn with_repo_is_not_backed_by_files() {
        let config = with_changelog(ChangelogConfig {
            generate_crd: Some(true),
            ..Default::default()
        });
        assert!(config.generate_crd());
        assert!(config.global_config_loaded_from().is_none());
        assert!(config.repo_config_loaded_from().is_none());
        assert_eq!(config.global, GlobalConfig::default());
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.release_yaml_file(), "release.yaml");
        assert_eq!(config.crd_yaml_file(), "release-crd.yaml");
        assert!(config.generate_release_yaml());
        assert!(!config.generate_crd());
        assert!(!config.overwrite_crd());
        assert!(config.update_release());
        assert!(!config.include_merge_commits());
        assert!(!config.fail_if_no_commits());
        assert!(config.templates_dir().is_none());
        assert_eq!(config.token_env_names(), vec!["GITHUB_TOKEN", "GIT_API_TOKEN"]);
    }

    #[test]
    fn load_global_from_env() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");

        fs::write(
            &config_path,
            r#"
            tracker = "jira"
            token_env = "MY_TOKEN"
            "#,
        )
        .unwrap();

        std::env::set_var("RELNOTE_CONFIG", config_path.to_str().unwrap());

        let result = Config::load(None).unwrap();
        let config = result.config;

        assert_eq!(config.tracker(), Some(TrackerKind::Jira));
        assert_eq!(config.token_env_names(), vec!["MY_TOKEN"]);

        std::env::remove_var("RELNOTE_CONFIG");
    }

    #[test]
    fn load_repo_config() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(REPO_CONFIG_FILE),
            r#"
            [changelog]
            generate_crd = true
            update_release = false
            branch = "main"
            "#,
        )
        .unwrap();

        let result = Config::load(Some(temp.path())).unwrap();
        let config = result.config;

        assert!(config.generate_crd());
        assert!(!config.update_release());
        assert_eq!(config.branch(), Some("main"));
        assert!(result.warnings.is_empty());
        assert_eq!(
            config.repo_config_loaded_from(),
            Some(temp.path().join(REPO_CONFIG_FILE).as_path())
        );
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(REPO_CONFIG_FILE),
            r#"
            [changelog]
            generate_crd = true
            unknown_field = true
            "#,
        )
        .unwrap();

        let result = Config::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn overlapping_template_settings_warn() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(REPO_CONFIG_FILE),
            r#"
            [changelog]
            header = "inline"
            header_file = "header.md"
            "#,
        )
        .unwrap();

        let result = Config::load(Some(temp.path())).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("header_file is ignored"));
    }

    #[test]
    fn template_text_sources() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("footer.md"), "-- {{ .Name }}").unwrap();

        let config = with_changelog(ChangelogConfig {
            header: Some("H:{{.Version}}\n".to_string()),
            footer_file: Some("footer.md".to_string()),
            ..Default::default()
        });

        assert_eq!(config.header_template(temp.path()).unwrap(), "H:{{.Version}}\n");
        assert_eq!(config.footer_template(temp.path()).unwrap(), "-- {{ .Name }}");
        assert_eq!(Config::default().header_template(temp.path()).unwrap(), "");
    }

    #[test]
    fn missing_template_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let config = with_changelog(ChangelogConfig {
            header_file: Some("nope.md".to_string()),
            ..Default::default()
        });

        assert!(matches!(
            config.header_template(temp.path()),
            Err(ConfigError::TemplateReadError { .. })
        ));
    }
}
