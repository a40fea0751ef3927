//! Client configuration.
//!
//! Credentials are resolved once and passed to [`crate::Vast::new`]; the
//! client never reads the environment itself.

use std::time::Duration;

use crate::providers::traits::VastError;

/// Base URL for the vast.ai REST API.
pub const DEFAULT_API_URL: &str = "https://cloud.vast.ai/api/v0";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "VAST_API_KEY";

/// Legacy environment variable for the API key, checked second.
pub const LEGACY_API_KEY_ENV: &str = "API_KEY";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "VAST_API_URL";

/// How each request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPolicy {
    /// Client-side timeout. `None` waits for the transport indefinitely.
    pub timeout: Option<Duration>,
}

impl RequestPolicy {
    /// One attempt per request, no retries and no client-side timeout.
    #[must_use]
    pub const fn single_attempt() -> Self {
        Self { timeout: None }
    }
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self::single_attempt()
    }
}

/// Configuration for the [`crate::Vast`] client.
#[derive(Clone, PartialEq, Eq)]
pub struct VastConfig {
    /// API key sent as the `api_key` query parameter.
    pub api_key: String,
    /// API root, without trailing slash.
    pub base_url: String,
    /// Request policy.
    pub policy: RequestPolicy,
}

// Keep the key out of logs.
impl std::fmt::Debug for VastConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VastConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("policy", &self.policy)
            .finish()
    }
}

impl VastConfig {
    /// Create a configuration for the public API.
    ///
    /// # Errors
    /// Returns [`VastError::Config`] if `api_key` is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self, VastError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(VastError::Config(format!(
                "API key is empty; set {API_KEY_ENV} or pass --api-key"
            )));
        }

        Ok(Self {
            api_key,
            base_url: DEFAULT_API_URL.to_string(),
            policy: RequestPolicy::single_attempt(),
        })
    }

    /// Point the client at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load configuration from the process environment.
    ///
    /// Reads:
    /// - `VAST_API_KEY` (or `API_KEY`) - API key
    /// - `VAST_API_URL` - optional API root
    ///
    /// # Errors
    /// Returns [`VastError::Config`] if no API key is set.
    pub fn from_env() -> Result<Self, VastError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns [`VastError::Config`] if no API key is found.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, VastError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| lookup(LEGACY_API_KEY_ENV))
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| VastError::Config(format!("{API_KEY_ENV} not set")))?;

        let config = Self::new(api_key)?;
        Ok(match lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            Some(url) => config.with_base_url(url),
            None => config,
        })
    }
}
