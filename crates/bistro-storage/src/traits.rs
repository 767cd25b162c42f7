//! Storage abstraction trait
//!
//! This module defines the Storage trait the upload pipeline writes through.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload failed with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Upload request failed: {0}")]
    Transport(String),

    #[error("Invalid storage response: {0}")]
    InvalidResponse(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, UploadError>;

/// Object metadata returned by the store after a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredObject {
    /// Name assigned by the store; used to build the public URL.
    pub name: String,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default, rename = "contentType")]
    pub content_type: Option<String>,
    /// Size in bytes, reported by the JSON API as a decimal string.
    #[serde(default)]
    pub size: Option<String>,
}

/// Object store the pipeline uploads into.
///
/// Writes are single attempts and not transactional: a failure after the body was
/// sent may leave an object behind with no URL returned.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload `data` under `object_key`, authenticated with `bearer_token`.
    async fn upload_with_key(
        &self,
        bearer_token: &str,
        object_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<StoredObject>;

    /// Public URL for an object this store has accepted.
    fn public_url(&self, object_name: &str) -> String;

    fn bucket(&self) -> &str;
}
