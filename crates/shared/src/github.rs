//! GitHub OAuth and REST API client.
//!
//! Covers the handful of calls the service makes: the OAuth code exchange,
//! account discovery at sign-in, the rate-limit probe, and issue creation.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GitHubConfig;
use crate::types::AccessToken;

/// Scopes requested at sign-in: private repos for filing issues, org membership for sync.
const OAUTH_SCOPES: &str = "repo,read:org";

/// Largest page size the list endpoints accept.
const PER_PAGE: u32 = 100;

/// Upper bound on pages followed for one listing.
const MAX_PAGES: usize = 50;

/// GitHub client errors.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Transport-level failure (connect, timeout, malformed body).
    #[error("GitHub request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// GitHub answered with an unexpected status.
    #[error("GitHub returned status {status} for {endpoint}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Endpoint path that was called.
        endpoint: String,
    },

    /// The OAuth code exchange did not yield a token.
    #[error("OAuth code exchange failed: {0}")]
    OAuth(String),

    /// A configured base URL could not be parsed.
    #[error("invalid GitHub URL: {0}")]
    InvalidUrl(String),
}

/// Authenticated GitHub account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubUser {
    /// Numeric GitHub account ID.
    pub id: i64,
    /// Login name.
    pub login: String,
}

/// Owner reference embedded in repository payloads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubOwner {
    /// Owner login (user or organization).
    pub login: String,
}

/// Repository as listed by `/user/repos` and `/orgs/{org}/repos`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubRepository {
    /// Repository name.
    pub name: String,
    /// Owning account.
    pub owner: GitHubOwner,
}

/// Organization as listed by `/user/orgs`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubOrganization {
    /// Organization login.
    pub login: String,
}

/// Core API rate-limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimit {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Window reset as a Unix timestamp.
    pub reset: i64,
}

#[derive(Deserialize)]
struct RateLimitResources {
    core: RateLimit,
}

#[derive(Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Issue payload for `POST /repos/{owner}/{repo}/issues`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateIssue {
    /// Issue title.
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Label names; omitted when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Issue returned after creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedIssue {
    /// Issue number within the repository.
    pub number: u64,
    /// Browser URL of the issue.
    pub html_url: String,
}

/// GitHub client for OAuth and REST calls.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    config: GitHubConfig,
}

impl GitHubClient {
    /// Creates a new GitHub client.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::Request` if the HTTP client cannot be built.
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    /// Builds the URL the visitor is sent to for authorization.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::InvalidUrl` if the configured OAuth URL is invalid.
    pub fn authorize_url(&self, state: &str) -> Result<Url, GitHubError> {
        let base = format!("{}/login/oauth/authorize", self.oauth_base());
        Url::parse_with_params(
            &base,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("scope", OAUTH_SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| GitHubError::InvalidUrl(e.to_string()))
    }

    /// Exchanges an OAuth callback code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::OAuth` when GitHub reports an error instead of a token.
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, GitHubError> {
        let endpoint = "/login/oauth/access_token";
        let response = self
            .http
            .post(format!("{}{endpoint}", self.oauth_base()))
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await?;

        let body: TokenResponse = Self::decode(response, endpoint, StatusCode::OK).await?;

        match body.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
            _ => Err(GitHubError::OAuth(
                body.error_description
                    .or(body.error)
                    .unwrap_or_else(|| "no access token returned".to_string()),
            )),
        }
    }

    /// Fetches the account the token belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or GitHub rejects the token.
    pub async fn current_user(&self, token: &AccessToken) -> Result<GitHubUser, GitHubError> {
        self.get_json(token, "/user").await
    }

    /// Lists repositories the user can access, across all pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn user_repositories(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<GitHubRepository>, GitHubError> {
        self.get_pages(token, "/user/repos").await
    }

    /// Lists organizations the user belongs to, across all pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn user_organizations(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<GitHubOrganization>, GitHubError> {
        self.get_pages(token, "/user/orgs").await
    }

    /// Lists repositories of an organization, across all pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn organization_repositories(
        &self,
        token: &AccessToken,
        organization: &str,
    ) -> Result<Vec<GitHubRepository>, GitHubError> {
        self.get_pages(token, &format!("/orgs/{organization}/repos"))
            .await
    }

    /// Reads the core rate-limit window.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn rate_limit(&self, token: &AccessToken) -> Result<RateLimit, GitHubError> {
        let response: RateLimitResponse = self.get_json(token, "/rate_limit").await?;
        Ok(response.resources.core)
    }

    /// Files an issue on a repository.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::Status` unless GitHub answers `201 Created`.
    pub async fn create_issue(
        &self,
        token: &AccessToken,
        owner: &str,
        repository: &str,
        issue: &CreateIssue,
    ) -> Result<CreatedIssue, GitHubError> {
        let endpoint = format!("/repos/{owner}/{repository}/issues");
        let request = self.http.post(format!("{}{endpoint}", self.api_base()));
        let response = Self::authorized(request, token)
            .json(issue)
            .send()
            .await?;

        Self::decode(response, &endpoint, StatusCode::CREATED).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        endpoint: &str,
    ) -> Result<T, GitHubError> {
        debug!(endpoint, "GitHub GET");
        let request = self.http.get(format!("{}{endpoint}", self.api_base()));
        let response = Self::authorized(request, token).send().await?;

        Self::decode(response, endpoint, StatusCode::OK).await
    }

    /// Collects a list endpoint by following `Link: rel="next"` headers.
    async fn get_pages<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        endpoint: &str,
    ) -> Result<Vec<T>, GitHubError> {
        let mut url = format!("{}{endpoint}?per_page={PER_PAGE}", self.api_base());
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            debug!(endpoint, page, "GitHub GET");
            let response = Self::authorized(self.http.get(&url), token).send().await?;
            let next = next_link(response.headers());
            let batch: Vec<T> = Self::decode(response, endpoint, StatusCode::OK).await?;
            items.extend(batch);

            match next {
                Some(next) => url = next,
                None => return Ok(items),
            }
        }

        warn!(endpoint, pages = MAX_PAGES, "GitHub listing truncated");
        Ok(items)
    }

    fn authorized(request: RequestBuilder, token: &AccessToken) -> RequestBuilder {
        request
            .bearer_auth(token.expose())
            .header(header::ACCEPT, "application/vnd.github+json")
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
        expected: StatusCode,
    ) -> Result<T, GitHubError> {
        if response.status() != expected {
            return Err(GitHubError::Status {
                status: response.status().as_u16(),
                endpoint: endpoint.to_string(),
            });
        }
        Ok(response.json().await?)
    }

    fn oauth_base(&self) -> &str {
        self.config.oauth_url.trim_end_matches('/')
    }

    fn api_base(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }
}

/// Target of the `rel="next"` entry in a `Link` header, if any.
fn next_link(headers: &header::HeaderMap) -> Option<String> {
    let value = headers.get(header::LINK)?.to_str().ok()?;
    value.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        params
            .split(';')
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| target.trim().trim_start_matches('<').trim_end_matches('>'))
            .map(String::from)
    })
}

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;
