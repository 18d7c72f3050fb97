use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "WILDSENSE_API_URL";

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Whole-request limit for the request/response endpoints. Streaming
    /// endpoints (detection stream, clip download) only use `connect_timeout`.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl RemoteConfig {
    /// Defaults, with the base URL taken from `WILDSENSE_API_URL` when set.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => config.with_base_url(url),
            _ => config,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}
