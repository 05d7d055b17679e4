//! Shared HTTP client, request helper, and error types for the CLI.

use std::fmt::{self, Display, Formatter};

use anyhow::anyhow;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use thiserror::Error;

use crate::config::CliConfig;

const USER_AGENT: &str = concat!("artie-cli/", env!("CARGO_PKG_VERSION"));

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Configuration(String),
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Wrap a request error with the operation that issued it. Status errors
    /// carry the raw response body so server-side detail reaches the operator.
    pub(crate) fn request(operation: &str, error: &ApiError) -> Self {
        match error.response_body() {
            Some(body) => Self::failure(anyhow!(
                "failed to {operation}: {error}, response: {body:?}"
            )),
            None => Self::failure(anyhow!("failed to {operation}: {error}")),
        }
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Configuration(message) | Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Errors raised while talking to the Artie API.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: url::ParseError },
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("request to {path} failed: {reason}")]
    Transport { path: String, reason: reqwest::Error },
    #[error("failed to read response from {path}: {reason}")]
    Body { path: String, reason: reqwest::Error },
    #[error("non-200 status code: {}", status.as_u16())]
    Status { status: StatusCode, body: String },
}

impl ApiError {
    /// Raw response text returned alongside a non-200 status.
    #[must_use]
    pub(crate) fn response_body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Authenticated client for the Artie deployment API.
#[derive(Clone)]
pub(crate) struct ArtieClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl ArtieClient {
    /// Construct a client with the configured timeout and credentials.
    pub(crate) fn new(config: &CliConfig) -> CliResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Issue a single request and return the raw response body.
    ///
    /// Only `200 OK` counts as success; any other status yields
    /// [`ApiError::Status`] carrying the body text.
    pub(crate) async fn send_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(method = %method, path, "sending request");

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|reason| ApiError::Transport {
            path: path.to_string(),
            reason,
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|reason| ApiError::Body {
            path: path.to_string(),
            reason,
        })?;

        if status != StatusCode::OK {
            tracing::debug!(status = status.as_u16(), path, "request rejected");
            return Err(ApiError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(bytes.to_vec())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let url = format!("{}{path}", self.base_url.as_str().trim_end_matches('/'));
        url.parse::<Url>()
            .map_err(|reason| ApiError::InvalidUrl { url, reason })
    }
}

/// Serialize a request payload to JSON bytes.
pub(crate) fn json_body<T: Serialize>(payload: &T) -> Result<Vec<u8>, ApiError> {
    Ok(serde_json::to_vec(payload)?)
}

#[cfg(test)]
pub(crate) fn test_client(base_url: &str) -> ArtieClient {
    ArtieClient::new(&CliConfig {
        api_key: "test-key".to_string(),
        api_url: base_url.parse().expect("valid URL"),
        timeout: std::time::Duration::from_secs(5),
    })
    .expect("client should build")
}
