use bistro_storage::{AuthError, UploadError};
use thiserror::Error;

use crate::preprocess::PreprocessError;
use crate::validator::ValidationError;

/// Failure of a single publish attempt, tagged by the stage that failed.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),
}

impl PublishError {
    /// Response body returned by the remote service, when there was one.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            PublishError::Auth(AuthError::Exchange { body, .. }) => Some(body),
            PublishError::Upload(UploadError::Rejected { body, .. }) => Some(body),
            _ => None,
        }
    }
}
