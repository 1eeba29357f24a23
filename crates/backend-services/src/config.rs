//! Backend connection settings.

use std::time::Duration;

/// Settings shared by all backend clients.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend base URL (e.g., "https://project.supabase.co").
    pub base_url: String,
    /// Service key sent as `apikey` and bearer token.
    pub service_key: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upload URL for an object.
    pub fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    /// Public URL for an object.
    pub fn public_object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    /// URL of a deployed function.
    pub fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = BackendConfig::new("https://backend.example.com/", "key");
        assert_eq!(
            config.object_url("chat-media", "a/b.jpg"),
            "https://backend.example.com/storage/v1/object/chat-media/a/b.jpg"
        );
        assert_eq!(
            config.public_object_url("chat-media", "a/b.jpg"),
            "https://backend.example.com/storage/v1/object/public/chat-media/a/b.jpg"
        );
        assert_eq!(
            config.function_url("transcribe-audio"),
            "https://backend.example.com/functions/v1/transcribe-audio"
        );
    }
}
