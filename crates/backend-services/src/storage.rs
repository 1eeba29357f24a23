//! Object storage uploads.

use reqwest::Client;
use tracing::debug;

use ingest_core::{async_trait, CollaboratorError, ObjectStore, StoredObject};

use crate::config::BackendConfig;
use crate::error::{check_status, BackendError};

/// Uploads objects into a single public bucket.
#[derive(Clone)]
pub struct StorageClient {
    http: Client,
    config: BackendConfig,
    bucket: String,
}

impl StorageClient {
    pub fn new(config: BackendConfig, bucket: impl Into<String>) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            bucket: bucket.into(),
        })
    }

    /// Upload bytes to `path`, replacing any existing object.
    pub async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, BackendError> {
        let url = self.config.object_url(&self.bucket, path);
        debug!(bucket = %self.bucket, path, size = bytes.len(), "Uploading object");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        check_status(response).await?;

        Ok(StoredObject {
            path: path.to_string(),
            public_url: self.config.public_object_url(&self.bucket, path),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, CollaboratorError> {
        Ok(self.put_object(path, bytes, content_type).await?)
    }
}
