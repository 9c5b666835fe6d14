use std::time::Duration;

use super::AppError;

/// Where the ledger service lives and how the settlement workflow paces itself.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Back-office base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Pause between two settle calls of a batch
    pub settle_delay: Duration,
    /// Pause before re-fetching the customer view after settling
    pub reload_delay: Duration,
    /// How long a transient notice stays visible
    pub notice_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(300),
            reload_delay: Duration::from_millis(500),
            notice_ttl: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "base URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }
        Ok(Self {
            base_url: trimmed.to_string(),
            ..Self::default()
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Zero every pacing delay. Handy for scripted runs and tests.
    pub fn without_delays(mut self) -> Self {
        self.settle_delay = Duration::ZERO;
        self.reload_delay = Duration::ZERO;
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = ClientConfig::new("https://cassa.example.com/").unwrap();
        assert_eq!(config.base_url, "https://cassa.example.com");
        assert_eq!(
            config.url("/movimenti/42/salda/"),
            "https://cassa.example.com/movimenti/42/salda/"
        );
    }

    #[test]
    fn test_new_rejects_non_http() {
        assert!(matches!(
            ClientConfig::new("cassa.example.com"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_defaults_match_page_timing() {
        let config = ClientConfig::default();
        assert_eq!(config.settle_delay, Duration::from_millis(300));
        assert_eq!(config.reload_delay, Duration::from_millis(500));
        assert_eq!(config.without_delays().settle_delay, Duration::ZERO);
    }
}
