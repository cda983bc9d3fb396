//! scm::github
//!
//! GitHub client using the REST API.
//!
//! # Design
//!
//! One client implements all three hosting traits for a single repository:
//!
//! - issues and pull requests: `GET /repos/{o}/{r}/issues/{n}`; GitHub serves
//!   pull requests from the same endpoint and marks them with a
//!   `pull_request` key
//! - users: `GET /search/users?q=<email> in:email`, `GET /users/{login}` and
//!   `GET /repos/{o}/{r}/contributors`
//! - releases: `GET /repos/{o}/{r}/releases/tags/{tag}`, `POST` and `PATCH`
//!   on `/repos/{o}/{r}/releases`
//!
//! # Authentication
//!
//! The token is optional. Reads against public repositories work without
//! one (with a low rate limit); release writes return
//! [`ScmError::AuthRequired`] when no token is configured.
//!
//! # Rate Limiting
//!
//! Returns `ScmError::RateLimited` when limits are hit. There is no retry;
//! the changelog treats lookups as best-effort.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{
    Issue, IssueTracker, Release, ReleaseInput, ReleaseStore, ScmClient, ScmError, TrackerKind,
    TrackerUser, UserDirectory,
};
use crate::core::types::CanonicalUser;
use crate::git::GitUrl;

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "relnote-cli";

/// GitHub client for one repository.
pub struct GitHubClient {
    client: Client,
    token: Option<String>,
    owner: String,
    repo: String,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("has_token", &self.token.is_some())
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubClient {
    /// Create a client for `owner/repo` against api.github.com.
    pub fn new(token: Option<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.filter(|t| !t.trim().is_empty()),
            owner: owner.into(),
            repo: repo.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Use a different API base URL.
    ///
    /// For GitHub Enterprise (`https://github.example.com/api/v3`) or a mock
    /// server in tests.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Create a client from a remote URL.
    ///
    /// Returns `None` if the URL cannot be parsed.
    pub fn from_remote_url(url: &str, token: Option<String>) -> Option<Self> {
        let parsed = GitUrl::parse(url)?;
        Some(Self::new(token, parsed.owner, parsed.name))
    }

    /// Repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Whether a token is configured.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn headers(&self) -> Result<HeaderMap, ScmError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ScmError::AuthFailed("token contains invalid characters".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Build URL for a top-level endpoint.
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ScmError> {
        request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ScmError::NetworkError(e.to_string()))
    }

    /// GET a JSON resource.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ScmError> {
        let response = self.send(self.client.get(url)).await?;
        self.handle_response(response).await
    }

    /// GET a JSON resource, mapping 404 to `None`.
    async fn get_optional<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
    ) -> Result<Option<T>, ScmError> {
        match self.get_json(url).await {
            Ok(value) => Ok(Some(value)),
            Err(ScmError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ScmError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ScmError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(Self::error_from_response(response, status).await)
        }
    }

    async fn error_from_response(response: Response, status: StatusCode) -> ScmError {
        // Secondary rate limits come back as 403 with the remaining count at zero.
        let rate_limited = response
            .headers()
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "0");

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => ScmError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN if rate_limited => ScmError::RateLimited,
            StatusCode::FORBIDDEN => ScmError::AuthFailed(format!("Permission denied: {}", message)),
            StatusCode::NOT_FOUND => ScmError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ScmError::RateLimited,
            _ if status.is_server_error() => ScmError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ScmError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }

    fn require_token(&self) -> Result<(), ScmError> {
        if self.token.is_some() {
            Ok(())
        } else {
            Err(ScmError::AuthRequired)
        }
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    fn kind(&self) -> TrackerKind {
        TrackerKind::Git
    }

    fn home_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }

    async fn get_issue(&self, id: &str) -> Result<Option<Issue>, ScmError> {
        let number: u64 = match id.trim_start_matches('#').parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::debug!(id, "not a GitHub issue number");
                return Ok(None);
            }
        };

        let issue: Option<GitHubIssue> =
            self.get_optional(&self.repo_url(&format!("issues/{}", number))).await?;
        Ok(issue.map(Into::into))
    }
}

#[async_trait]
impl UserDirectory for GitHubClient {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<CanonicalUser>, ScmError> {
        let request = self
            .client
            .get(self.api_url("search/users"))
            .query(&[("q", format!("{} in:email", email))]);
        let response = self.send(request).await?;
        let result: GitHubUserSearch = self.handle_response(response).await?;

        let Some(hit) = result.items.into_iter().next() else {
            return Ok(None);
        };

        // Search results carry only the login; fetch the profile for name and email.
        let mut user = self
            .find_user_by_login(&hit.login)
            .await?
            .unwrap_or_else(|| CanonicalUser::from_login(hit.login));
        if user.email.is_empty() {
            user.email = email.to_string();
        }
        Ok(Some(user))
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<CanonicalUser>, ScmError> {
        let user: Option<GitHubUser> = self
            .get_optional(&self.api_url(&format!("users/{}", login)))
            .await?;
        Ok(user.map(|u| TrackerUser::from(u).to_canonical()))
    }

    async fn contributors(&self) -> Result<Vec<CanonicalUser>, ScmError> {
        let users: Vec<GitHubUser> = self
            .get_json(&self.repo_url("contributors?per_page=100"))
            .await?;
        Ok(users
            .into_iter()
            .map(|u| TrackerUser::from(u).to_canonical())
            .collect())
    }
}

#[async_trait]
impl ReleaseStore for GitHubClient {
    fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    async fn find_release_by_tag(&self, tag: &str) -> Result<Option<Release>, ScmError> {
        let release: Option<GitHubRelease> = self
            .get_optional(&self.repo_url(&format!("releases/tags/{}", tag)))
            .await?;
        Ok(release.map(Into::into))
    }

    async fn create_release(&self, input: &ReleaseInput) -> Result<Release, ScmError> {
        self.require_token()?;
        let request = self
            .client
            .post(self.repo_url("releases"))
            .json(&ReleaseBody::from(input));
        let response = self.send(request).await?;
        let release: GitHubRelease = self.handle_response(response).await?;
        Ok(release.into())
    }

    async fn update_release(&self, id: u64, input: &ReleaseInput) -> Result<Release, ScmError> {
        self.require_token()?;
        let request = self
            .client
            .patch(self.repo_url(&format!("releases/{}", id)))
            .json(&ReleaseBody::from(input));
        let response = self.send(request).await?;
        let release: GitHubRelease = self.handle_response(response).await?;
        Ok(release.into())
    }
}

impl ScmClient for GitHubClient {
    fn name(&self) -> &'static str {
        "github"
    }

    fn as_tracker(&self) -> &dyn IssueTracker {
        self
    }

    fn as_directory(&self) -> &dyn UserDirectory {
        self
    }

    fn as_release_store(&self) -> &dyn ReleaseStore {
        self
    }
}

// ============================================================================
// GitHub API types
// ============================================================================

#[derive(Serialize)]
struct ReleaseBody<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
}

impl<'a> From<&'a ReleaseInput> for ReleaseBody<'a> {
    fn from(input: &'a ReleaseInput) -> Self {
        Self {
            tag_name: &input.tag,
            name: &input.title,
            body: &input.description,
        }
    }
}

#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl From<GitHubUser> for TrackerUser {
    fn from(user: GitHubUser) -> Self {
        TrackerUser {
            login: user.login,
            name: user.name.filter(|n| !n.is_empty()),
            email: user.email.filter(|e| !e.is_empty()),
            url: user.html_url,
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Deserialize)]
struct GitHubUserSearch {
    #[serde(default)]
    items: Vec<GitHubUserSearchItem>,
}

#[derive(Deserialize)]
struct GitHubUserSearchItem {
    login: String,
}

#[derive(Deserialize)]
struct GitHubLabel {
    name: String,
}

/// Issue (or pull request) response format.
#[derive(Deserialize)]
struct GitHubIssue {
    html_url: String,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user: Option<GitHubUser>,
    #[serde(default)]
    closed_by: Option<GitHubUser>,
    #[serde(default)]
    assignees: Option<Vec<GitHubUser>>,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl From<GitHubIssue> for Issue {
    fn from(gh: GitHubIssue) -> Self {
        Issue {
            url: gh.html_url,
            title: gh.title,
            body: gh.body.unwrap_or_default(),
            state: gh.state,
            created_at: gh.created_at,
            author: gh.user.map(Into::into),
            closed_by: gh.closed_by.map(Into::into),
            assignees: gh
                .assignees
                .map(|users| users.into_iter().map(Into::into).collect()),
            labels: gh.labels.into_iter().map(|l| l.name).collect(),
            pull_request: gh.pull_request.is_some(),
        }
    }
}

#[derive(Deserialize)]
struct GitHubRelease {
    id: u64,
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

impl From<GitHubRelease> for Release {
    fn from(gh: GitHubRelease) -> Self {
        Release {
            id: gh.id,
            tag: gh.tag_name,
            title: gh.name.unwrap_or_default(),
            description: gh.body.unwrap_or_default(),
            link: gh.html_url.unwrap_or_default(),
        }
    }
}
