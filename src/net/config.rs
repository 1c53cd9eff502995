//! API location and timeouts parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "/api";
pub const DEFAULT_API_TARGET: &str = "http://localhost:1010";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

pub const API_BASE_VAR: &str = "COURSEGATE_API_BASE";
pub const API_TARGET_VAR: &str = "COURSEGATE_API_TARGET";
pub const REQUEST_TIMEOUT_VAR: &str = "COURSEGATE_REQUEST_TIMEOUT_MS";
pub const CONNECT_TIMEOUT_VAR: &str = "COURSEGATE_CONNECT_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API target `{0}` (expected an http:// or https:// URL)")]
    InvalidTarget(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Absolute API root, no trailing slash.
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ApiConfig {
    /// Build typed API config from environment variables.
    ///
    /// Optional:
    /// - `COURSEGATE_API_BASE`: API root, default `/api`. A relative root is
    ///   served from the API target, the way the dev proxy forwards it.
    /// - `COURSEGATE_API_TARGET`: origin for a relative root, default
    ///   `http://localhost:1010`
    /// - `COURSEGATE_REQUEST_TIMEOUT_MS`: default 10000
    /// - `COURSEGATE_CONNECT_TIMEOUT_MS`: default 5000
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`], reading each variable through
    /// `lookup`. Lets a front end layer its own flags over the environment.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base = lookup(API_BASE_VAR);
        let target = lookup(API_TARGET_VAR);
        Ok(Self {
            base_url: resolve_base_url(base.as_deref(), target.as_deref())?,
            request_timeout: Duration::from_millis(parse_u64(
                lookup(REQUEST_TIMEOUT_VAR).as_deref(),
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            connect_timeout: Duration::from_millis(parse_u64(
                lookup(CONNECT_TIMEOUT_VAR).as_deref(),
                DEFAULT_CONNECT_TIMEOUT_MS,
            )),
        })
    }

    /// Config for an absolute API root with default timeouts.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: resolve_base_url(Some(base_url), None)?,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        })
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

fn parse_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Combine an API root with the target origin.
///
/// An empty or missing root falls back to `/api`. An absolute root is used
/// as-is; a relative one is appended to the target.
pub fn resolve_base_url(base: Option<&str>, target: Option<&str>) -> Result<String, ConfigError> {
    let base = base.map(str::trim).filter(|b| !b.is_empty()).unwrap_or(DEFAULT_API_BASE);
    if is_absolute(base) {
        return Ok(base.trim_end_matches('/').to_owned());
    }

    let target = target.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(DEFAULT_API_TARGET);
    if !is_absolute(target) {
        return Err(ConfigError::InvalidTarget(target.to_owned()));
    }

    let origin = target.trim_end_matches('/');
    let path = base.trim_matches('/');
    if path.is_empty() {
        Ok(origin.to_owned())
    } else {
        Ok(format!("{origin}/{path}"))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
