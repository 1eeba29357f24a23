//! Mock object store.

use std::sync::{Arc, Mutex};

use ingest_core::{async_trait, CollaboratorError, ObjectStore, StoredObject};

use crate::lock;

/// A recorded upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub path: String,
    pub content_type: String,
    pub size: usize,
}

/// An object store that keeps nothing but a log of uploads.
#[derive(Clone, Default)]
pub struct MockObjectStore {
    uploads: Arc<Mutex<Vec<Upload>>>,
    fail: bool,
}

impl MockObjectStore {
    /// Base of the URLs returned for uploaded objects.
    pub const PUBLIC_BASE: &'static str = "https://storage.test/public";

    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        lock(&self.uploads).clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Status {
                status: 503,
                body: "storage unavailable".to_string(),
            });
        }

        lock(&self.uploads).push(Upload {
            path: path.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
        });

        Ok(StoredObject {
            path: path.to_string(),
            public_url: format!("{}/{}", Self::PUBLIC_BASE, path),
        })
    }
}
