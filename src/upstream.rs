//! Upstream client for the GitHub REST API.
//!
//! The [`Upstream`] trait is the seam the indexer depends on; [`GitHubClient`]
//! is the production implementation. Tests substitute an in-memory fake.
//!
//! # Endpoints
//!
//! | Call | Request |
//! |------|---------|
//! | [`list_closed_pulls`](Upstream::list_closed_pulls) | `GET /repos/{repo}/pulls?state=closed&sort=updated&direction=desc` |
//! | [`fetch_diff`](Upstream::fetch_diff) | `GET {diff_url}` with `Accept: application/vnd.github.v3.diff` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GitHubConfig;
use crate::error::UpstreamError;
use crate::models::PullSummary;

/// Maximum number of body characters carried in [`UpstreamError::Http`].
const ERROR_BODY_LIMIT: usize = 500;

/// Source of closed pull requests and their diffs.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// One page (1-based) of closed pull requests, most recently updated first.
    async fn list_closed_pulls(
        &self,
        repo: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<PullSummary>, UpstreamError>;

    /// The unified diff behind a [`PullSummary::diff_url`].
    async fn fetch_diff(&self, diff_url: &str) -> Result<String, UpstreamError>;
}

pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
    user_agent: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Builds a client from configuration, reading the token from the
    /// environment variable named in `github.token_env`.
    pub fn new(config: &GitHubConfig) -> Result<Self, reqwest::Error> {
        let token = config.token();
        if token.is_none() {
            warn!(
                token_env = %config.token_env,
                "no GitHub token found; upstream calls will be unauthenticated"
            );
        }
        Self::with_token(config, token)
    }

    pub fn with_token(config: &GitHubConfig, token: Option<String>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            token,
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send_for_text(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<String, UpstreamError> {
        let transport = |source| UpstreamError::Transport {
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(UpstreamError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        Ok(body)
    }
}

#[derive(Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Deserialize)]
struct RawPull {
    number: i64,
    title: String,
    user: Option<RawUser>,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    diff_url: String,
}

impl From<RawPull> for PullSummary {
    fn from(raw: RawPull) -> Self {
        PullSummary {
            number: raw.number,
            title: raw.title,
            // Deleted accounts come back as a null user.
            author_login: raw.user.map(|u| u.login).unwrap_or_else(|| "ghost".to_string()),
            created_at: raw.created_at,
            closed_at: raw.closed_at,
            diff_url: raw.diff_url,
        }
    }
}

/// Decodes a listing page body into summaries.
pub fn parse_pulls_page(url: &str, body: &str) -> Result<Vec<PullSummary>, UpstreamError> {
    let raw: Vec<RawPull> = serde_json::from_str(body).map_err(|e| UpstreamError::Malformed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(raw.into_iter().map(PullSummary::from).collect())
}

#[async_trait]
impl Upstream for GitHubClient {
    async fn list_closed_pulls(
        &self,
        repo: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<PullSummary>, UpstreamError> {
        let url = format!("{}/repos/{}/pulls", self.api_base, repo);
        let request = self
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .query(&[
                ("state", "closed".to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
                ("per_page", page_size.to_string()),
                ("page", page.to_string()),
            ]);

        let body = self.send_for_text(&url, request).await?;
        let pulls = parse_pulls_page(&url, &body)?;
        debug!(repo, page, count = pulls.len(), "fetched pull request page");
        Ok(pulls)
    }

    async fn fetch_diff(&self, diff_url: &str) -> Result<String, UpstreamError> {
        let request = self
            .get(diff_url)
            .header(ACCEPT, "application/vnd.github.v3.diff");
        let diff = self.send_for_text(diff_url, request).await?;
        debug!(diff_url, diff_bytes = diff.len(), "fetched diff");
        Ok(diff)
    }
}
