//! Inbound WhatsApp webhook server.
//!
//! Receives provider webhooks and agent-originated events and hands them to
//! the ingestion pipeline.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use backend_services::{BackendConfig, StorageClient, TranscriptionClient};
use broadcaster::{Broadcaster, RealtimeConfig};
use database::Database;
use ingest::{Collaborators, Pipeline, PipelineConfig};
use provider_client::{ProviderClient, ProviderConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting webhook server");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let provider = ProviderClient::new(
        ProviderConfig::new(&config.provider_base_url).with_timeout(config.media_timeout),
    )?;
    let backend = BackendConfig::new(&config.backend_url, &config.backend_service_key);
    let storage = StorageClient::new(backend.clone(), &config.media_bucket)?;
    let transcription = TranscriptionClient::new(backend, &config.transcribe_function)?;
    let broadcaster = Broadcaster::new(RealtimeConfig::new(
        &config.backend_url,
        &config.backend_service_key,
    ))?;

    let pipeline = Pipeline::new(
        db,
        Collaborators {
            media_source: Arc::new(provider),
            object_store: Arc::new(storage),
            publisher: Arc::new(broadcaster),
            transcriber: Arc::new(transcription),
        },
        PipelineConfig {
            media_timeout: config.media_timeout,
            extra_topics: config.broadcast_topics.clone(),
            ..Default::default()
        },
    );

    let app = routes::router().with_state(AppState::new(pipeline));

    info!(addr = %config.addr, "Webhook server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
