//! Environment-derived configuration for the CLI.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use artie_telemetry::LogFormat;
use reqwest::Url;

use crate::client::{CliError, CliResult};

pub(crate) const ENV_API_KEY: &str = "ARTIE_API_KEY";
pub(crate) const ENV_API_URL_OVERRIDE: &str = "ARTIE_API_URL_OVERRIDE";
pub(crate) const ENV_HTTP_TIMEOUT_SECS: &str = "ARTIE_HTTP_TIMEOUT_SECS";
pub(crate) const ENV_LOG_FORMAT: &str = "ARTIE_LOG_FORMAT";
pub(crate) const DEFAULT_API_URL: &str = "https://api.artie.com";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings required to reach the Artie API.
#[derive(Clone)]
pub(crate) struct CliConfig {
    pub(crate) api_key: String,
    pub(crate) api_url: Url,
    pub(crate) timeout: Duration,
}

impl Debug for CliConfig {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CliConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CliConfig {
    /// Read configuration through `lookup`, typically `std::env::var`.
    ///
    /// Blank values are treated as unset.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CliResult<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read(ENV_API_KEY)
            .ok_or_else(|| CliError::configuration(format!("{ENV_API_KEY} is not set")))?;

        let api_url = match read(ENV_API_URL_OVERRIDE) {
            Some(raw) => parse_url(&raw).map_err(|err| {
                CliError::configuration(format!("{ENV_API_URL_OVERRIDE} is invalid: {err}"))
            })?,
            None => parse_url(DEFAULT_API_URL).map_err(CliError::configuration)?,
        };

        let timeout_secs = match read(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    CliError::configuration(format!(
                        "{ENV_HTTP_TIMEOUT_SECS} must be a positive number of seconds, got '{raw}'"
                    ))
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            api_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Resolve the log format from `ARTIE_LOG_FORMAT`, falling back to the build default.
pub(crate) fn log_format(lookup: impl Fn(&str) -> Option<String>) -> LogFormat {
    lookup(ENV_LOG_FORMAT)
        .as_deref()
        .and_then(LogFormat::parse)
        .unwrap_or_else(LogFormat::infer)
}

/// Parse an API base URL, accepting only HTTP(S) schemes.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    let url = input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("invalid URL '{input}': unsupported scheme '{other}'")),
    }
}
