use crate::error::{GenerationError, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";
pub const DEFAULT_MODEL: &str = "bytedance/seedream-4";

/// Connection and polling settings for the Replicate predictions API.
#[derive(Clone)]
pub struct ReplicateConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub model: String,
    pub poll_interval: Duration,
    pub status_interval: Duration,
    pub timeout: Duration,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        ReplicateConfig {
            api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            poll_interval: Duration::from_secs(1),
            status_interval: Duration::from_secs(10),
            timeout: Duration::from_secs(600),
        }
    }
}

impl std::fmt::Debug for ReplicateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("poll_interval", &self.poll_interval)
            .field("status_interval", &self.status_interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ReplicateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay any `REPLICATE_*` / `SEEDREAM_*` variables on the defaults.
    /// Unparseable numeric values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_token = env::var("REPLICATE_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        let base_url = env::var("REPLICATE_BASE_URL").unwrap_or(defaults.base_url);
        let model = env::var("SEEDREAM_MODEL").unwrap_or(defaults.model);
        let poll_interval = env::var("SEEDREAM_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);
        let status_interval = env::var("SEEDREAM_STATUS_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.status_interval);
        let timeout = env::var("SEEDREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        ReplicateConfig {
            api_token,
            base_url,
            model,
            poll_interval,
            status_interval,
            timeout,
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_status_interval(mut self, interval: Duration) -> Self {
        self.status_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(GenerationError::Config(format!(
                "base URL must be http(s), got '{}'",
                self.base_url
            )));
        }
        match self.model.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {}
            _ => {
                return Err(GenerationError::Config(format!(
                    "model must be 'owner/name', got '{}'",
                    self.model
                )));
            }
        }
        if self.poll_interval.is_zero() {
            return Err(GenerationError::Config(
                "poll interval must be positive".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(GenerationError::Config("timeout must be positive".into()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReplicateConfig::new();
        assert_eq!(config.model, "bytedance/seedream-4");
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.status_interval, Duration::from_secs(10));
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_builders_and_api_root() {
        let config = ReplicateConfig::new()
            .with_base_url("http://localhost:8080/v1/")
            .with_timeout(Duration::from_secs(30))
            .with_api_token("r8_secret");
        assert_eq!(config.api_root(), "http://localhost:8080/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));

        let debug = format!("{:?}", config);
        assert!(!debug.contains("r8_secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_validate_rejects_unusable_settings() {
        assert!(ReplicateConfig::new().validate().is_ok());

        let err = ReplicateConfig::new()
            .with_model("seedream-4")
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert_eq!(
            err.to_string(),
            "Configuration error: model must be 'owner/name', got 'seedream-4'"
        );

        assert!(ReplicateConfig::new()
            .with_base_url("api.replicate.com")
            .validate()
            .is_err());
        assert!(ReplicateConfig::new()
            .with_poll_interval(Duration::ZERO)
            .validate()
            .is_err());
        assert!(ReplicateConfig::new()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
