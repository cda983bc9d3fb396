//! scm::factory
//!
//! Client selection and creation.
//!
//! Commands call [`create_client`] instead of naming a concrete client.
//!
//! # Provider Detection
//!
//! - `github.com` remotes → [`GitHubClient`]
//! - any remote, when an API base is configured → [`GitHubClient`] against
//!   that base (GitHub Enterprise)
//! - anything else → `ScmError::NotImplemented`; callers fall back to
//!   [`OfflineScm`](super::offline::OfflineScm)

use super::github::GitHubClient;
use super::traits::{ScmClient, ScmError};
use crate::git::GitUrl;

/// Supported hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScmProvider {
    /// GitHub (github.com or Enterprise)
    GitHub,
}

impl ScmProvider {
    /// Provider name as used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            ScmProvider::GitHub => "github",
        }
    }
}

impl std::fmt::Display for ScmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the provider from a remote URL.
///
/// # Example
///
/// ```
/// use relnote::scm::{detect_provider, ScmProvider};
///
/// assert_eq!(
///     detect_provider("git@github.com:owner/repo.git", None),
///     Some(ScmProvider::GitHub)
/// );
/// assert_eq!(detect_provider("git@example.com:owner/repo.git", None), None);
/// ```
pub fn detect_provider(remote_url: &str, api_base: Option<&str>) -> Option<ScmProvider> {
    let url = GitUrl::parse(remote_url)?;
    if url.is_github() || api_base.is_some() {
        Some(ScmProvider::GitHub)
    } else {
        None
    }
}

/// Create a client for the repository behind a remote URL.
///
/// # Arguments
///
/// * `remote_url` - Git remote URL (SSH or HTTPS format)
/// * `token` - API token, if any
/// * `api_base` - API base URL override
///
/// # Errors
///
/// - `ScmError::NotFound` if the URL cannot be parsed
/// - `ScmError::NotImplemented` if the host is not supported
pub fn create_client(
    remote_url: &str,
    token: Option<String>,
    api_base: Option<&str>,
) -> Result<Box<dyn ScmClient>, ScmError> {
    let url = GitUrl::parse(remote_url).ok_or_else(|| {
        ScmError::NotFound(format!("could not parse remote URL '{}'", remote_url))
    })?;

    match detect_provider(remote_url, api_base) {
        Some(ScmProvider::GitHub) => {
            let mut client = GitHubClient::new(token, url.owner, url.name);
            if let Some(base) = api_base {
                client = client.with_api_base(base);
            }
            Ok(Box::new(client))
        }
        None => Err(ScmError::NotImplemented(format!(
            "no client for host '{}'",
            url.host
        ))),
    }
}
