use bistro_core::{PreprocessPolicy, UploadConfig, UploadRequest};

/// Rejections raised before any image work or network traffic
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid content type: {content_type} (expected image/*)")]
    InvalidContentType { content_type: String },

    #[error("Empty file")]
    EmptyFile,
}

/// Upload request validator
///
/// Only pass-through uploads are gated: their bytes reach the store unchanged. Under
/// compress the decoder decides what is an image, and large photos are shrunk.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    max_file_size: usize,
}

impl RequestValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.max_file_size_bytes())
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Only `image/*` types are published.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.trim().to_lowercase();
        let subtype = normalized.strip_prefix("image/").unwrap_or_default();

        if subtype.is_empty() {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    pub fn validate(
        &self,
        request: &UploadRequest,
        policy: &PreprocessPolicy,
    ) -> Result<(), ValidationError> {
        if policy.is_compress() {
            return Ok(());
        }
        self.validate_file_size(request.bytes.len())?;
        self.validate_content_type(&request.declared_mime_type)?;
        Ok(())
    }
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new(bistro_core::constants::DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024)
    }
}
