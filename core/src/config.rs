//! Client configuration and target URL resolution.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use url::Url;

use crate::error::ApiError;

pub const BASE_URL_ENV: &str = "BOOZE_BASE_URL";
pub const TIMEOUT_ENV: &str = "BOOZE_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid timeout {value:?}: expected whole seconds")]
    InvalidTimeout { value: String },

    #[error("invalid base url {value:?}: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
}

/// Settings a `Client` is constructed with.
///
/// `base_url` lets verb methods take paths relative to it. `timeout` is
/// passed to the default transport; custom transports ignore it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    #[serde(rename = "timeout_secs", deserialize_with = "timeout_from_secs")]
    pub timeout: Option<Duration>,
    pub headers: Vec<(String, String)>,
}

fn timeout_from_secs<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `BOOZE_BASE_URL` and `BOOZE_TIMEOUT_SECS` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            Url::parse(&base_url).map_err(|e| ConfigError::InvalidBaseUrl {
                value: base_url.clone(),
                reason: e.to_string(),
            })?;
            config.base_url = Some(base_url);
        }
        if let Some(raw) = lookup(TIMEOUT_ENV).filter(|v| !v.is_empty()) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout { value: raw.clone() })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Turn the `url` argument of a verb call into an absolute URL.
///
/// Absolute URLs pass through untouched; anything else is joined onto
/// `base_url` with RFC 3986 reference resolution.
pub fn resolve_url(base_url: Option<&str>, url: &str) -> Result<Url, ApiError> {
    if url.trim().is_empty() {
        return Err(ApiError::InvalidUrl("url must not be empty".to_string()));
    }
    match Url::parse(url) {
        Ok(absolute) => Ok(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base_url.ok_or_else(|| {
                ApiError::InvalidUrl(format!("relative url {url:?} requires a base url"))
            })?;
            let base = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base:?}: {e}")))?;
            base.join(url)
                .map_err(|e| ApiError::InvalidUrl(format!("{url:?}: {e}")))
        }
        Err(e) => Err(ApiError::InvalidUrl(format!("{url:?}: {e}"))),
    }
}
