//! Authenticated HTTP transport for the GitHub REST API.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use pipeline::RemoteApiError;

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// Connection settings for [`GithubClient`].
#[derive(Clone)]
pub struct GithubConfig {
    /// API base URL without a trailing slash (GitHub Enterprise uses `https://host/api/v3`).
    pub api_url: String,
    /// Token sent as `Authorization: Bearer`. Needs contents and secrets write access.
    pub token: String,
    pub user_agent: String,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// The client could not be constructed.
#[derive(Debug, Error)]
pub enum GithubClientError {
    #[error("GitHub token contains characters not allowed in an HTTP header")]
    InvalidToken,
    #[error("user agent contains characters not allowed in an HTTP header")]
    InvalidUserAgent,
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Error body GitHub returns alongside non-2xx statuses.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// A GitHub REST client. Implements both pipeline ports (see `contents` and `secrets`).
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Result<Self, GithubClientError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| GithubClientError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| GithubClientError::InvalidUserAgent)?,
        );

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Sends `request` and decodes a 2xx JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, RemoteApiError> {
        let response = self.send(operation, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteApiError::MalformedResponse {
                operation,
                message: e.to_string(),
            })
    }

    /// Like [`Self::send_json`] but maps HTTP 404 to `Ok(None)`.
    pub(crate) async fn send_json_optional<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Option<T>, RemoteApiError> {
        match self.send_json(operation, request).await {
            Ok(value) => Ok(Some(value)),
            Err(RemoteApiError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Sends `request` and discards a 2xx body.
    pub(crate) async fn send_empty(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(), RemoteApiError> {
        self.send(operation, request).await.map(|_| ())
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, RemoteApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteApiError::Transport {
                operation,
                message: e.to_string(),
            })?;

        let status = response.status();
        debug!(operation, status = status.as_u16(), "GitHub API response");
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
        };
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(operation, status = status.as_u16(), %message, "GitHub rejected credentials");
                Err(RemoteApiError::Unauthorized {
                    operation,
                    status: status.as_u16(),
                })
            }
            _ => Err(RemoteApiError::Status {
                operation,
                status: status.as_u16(),
                message,
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) fn client_for(base_url: &str) -> GithubClient {
        GithubClient::new(GithubConfig {
            api_url: base_url.to_string(),
            token: "test-token".to_string(),
            user_agent: "gpg-secret-bot-tests".to_string(),
        })
        .unwrap()
    }
}
