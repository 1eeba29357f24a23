//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use backend_services::transcription::DEFAULT_FUNCTION;

/// Webhook server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// WhatsApp provider API base URL.
    pub provider_base_url: String,
    /// Backend base URL for storage, realtime, and functions.
    pub backend_url: String,
    /// Backend service key.
    pub backend_service_key: String,
    /// Bucket for rehosted media.
    pub media_bucket: String,
    /// Bound on each media network step.
    pub media_timeout: Duration,
    /// Static topics every message is also broadcast to.
    pub broadcast_topics: Vec<String>,
    /// Name of the transcription function.
    pub transcribe_function: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `WEBHOOK_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:inbox.db?mode=rwc` |
    /// | `PROVIDER_BASE_URL` | Provider API base URL | (required) |
    /// | `BACKEND_URL` | Backend base URL | (required) |
    /// | `BACKEND_SERVICE_KEY` | Backend service key | (required) |
    /// | `MEDIA_BUCKET` | Storage bucket for media | `chat-media` |
    /// | `MEDIA_TIMEOUT_SECS` | Media step timeout | `20` |
    /// | `BROADCAST_TOPICS` | Extra comma-separated topics | (none) |
    /// | `TRANSCRIBE_FUNCTION` | Transcription function name | `transcribe-audio` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("WEBHOOK_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:inbox.db?mode=rwc".to_string());

        let provider_base_url = required("PROVIDER_BASE_URL")?;
        let backend_url = required("BACKEND_URL")?;
        let backend_service_key = required("BACKEND_SERVICE_KEY")?;

        let media_bucket = env::var("MEDIA_BUCKET").unwrap_or_else(|_| "chat-media".to_string());

        let media_timeout = match env::var("MEDIA_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout)?,
            Err(_) => ingest::pipeline::DEFAULT_MEDIA_TIMEOUT,
        };

        let broadcast_topics = env::var("BROADCAST_TOPICS")
            .map(|raw| parse_topics(&raw))
            .unwrap_or_default();

        let transcribe_function =
            env::var("TRANSCRIBE_FUNCTION").unwrap_or_else(|_| DEFAULT_FUNCTION.to_string());

        Ok(Self {
            addr,
            database_url,
            provider_base_url,
            backend_url,
            backend_service_key,
            media_bucket,
            media_timeout,
            broadcast_topics,
            transcribe_function,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_topics(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid WEBHOOK_ADDR format")]
    InvalidAddr,

    #[error("MEDIA_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,

    #[error("{0} environment variable is required")]
    Missing(&'static str),
}
