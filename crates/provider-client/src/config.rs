//! Configuration types for provider-client.

use std::time::Duration;

/// Configuration for connecting to the WhatsApp provider API.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the provider API (e.g., "https://free.uazapi.com").
    pub base_url: String,
    /// Bound on every request, including media downloads.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the media download endpoint URL.
    pub fn download_url(&self) -> String {
        format!("{}/message/download", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url_strips_trailing_slash() {
        let config = ProviderConfig::new("https://provider.example.com/");
        assert_eq!(config.download_url(), "https://provider.example.com/message/download");
        assert_eq!(config.timeout, ProviderConfig::DEFAULT_TIMEOUT);
    }
}
