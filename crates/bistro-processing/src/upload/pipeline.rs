use std::sync::Arc;
use std::time::Instant;

use bistro_core::{
    ConfigError, PreprocessPolicy, ProcessedAsset, UploadConfig, UploadRequest, UploadResult,
};
use bistro_storage::{CredentialSigner, GcsStorage, KeyGenerator, Storage, TokenSource};

use super::error::PublishError;
use crate::preprocess::{AssetPreprocessor, PreprocessError};
use crate::validator::RequestValidator;

/// Publishes one image per call and returns its public URL.
///
/// Each call is independent: no retries, no cleanup of an object left behind by a
/// failure after the body was sent. Calls may run concurrently and share the token
/// source.
pub struct UploadOrchestrator {
    preprocessor: Arc<AssetPreprocessor>,
    tokens: Arc<dyn TokenSource>,
    storage: Arc<dyn Storage>,
    keys: KeyGenerator,
    validator: RequestValidator,
    policy: PreprocessPolicy,
}

impl UploadOrchestrator {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        storage: Arc<dyn Storage>,
        keys: KeyGenerator,
        policy: PreprocessPolicy,
    ) -> Self {
        Self {
            preprocessor: Arc::new(AssetPreprocessor::default()),
            tokens,
            storage,
            keys,
            validator: RequestValidator::default(),
            policy,
        }
    }

    /// Wire the production signer and storage client from configuration.
    pub fn from_config(config: &UploadConfig) -> Result<Self, ConfigError> {
        let tokens = Arc::new(CredentialSigner::from_config(config));
        let storage = Arc::new(GcsStorage::from_config(config));
        let keys = KeyGenerator::from_config(config)?;

        Ok(Self::new(tokens, storage, keys, config.policy())
            .with_validator(RequestValidator::from_config(config)))
    }

    pub fn with_preprocessor(mut self, preprocessor: Arc<AssetPreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn with_validator(mut self, validator: RequestValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn policy(&self) -> &PreprocessPolicy {
        &self.policy
    }

    /// Publish `request` with the policy chosen at construction.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult, PublishError> {
        self.upload_with_policy(request, self.policy).await
    }

    pub async fn upload_with_policy(
        &self,
        request: UploadRequest,
        policy: PreprocessPolicy,
    ) -> Result<UploadResult, PublishError> {
        let start = Instant::now();
        let original_file_name = request.original_file_name.clone();

        self.validator.validate(&request, &policy).map_err(|e| {
            tracing::warn!(
                error = %e,
                file_name = %original_file_name,
                "Upload request rejected"
            );
            e
        })?;

        let asset = self.preprocess(request, policy).await?;
        let token = self.tokens.access_token().await?;
        let object_key = self.keys.generate(&asset.file_extension);
        let size = asset.bytes.len();

        let object = self
            .storage
            .upload_with_key(&token, &object_key, asset.bytes, &asset.mime_type)
            .await?;
        let public_url = self.storage.public_url(&object.name);

        tracing::info!(
            bucket = %self.storage.bucket(),
            key = %object.name,
            file_name = %original_file_name,
            content_type = %asset.mime_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image published"
        );

        Ok(UploadResult {
            public_url,
            object_name: object.name,
        })
    }

    async fn preprocess(
        &self,
        request: UploadRequest,
        policy: PreprocessPolicy,
    ) -> Result<ProcessedAsset, PreprocessError> {
        match policy {
            PreprocessPolicy::PassThrough => self.preprocessor.process(&request, &policy),
            PreprocessPolicy::Compress(_) => {
                // Decode, resize and encode are CPU bound.
                let preprocessor = Arc::clone(&self.preprocessor);
                tokio::task::spawn_blocking(move || preprocessor.process(&request, &policy))
                    .await
                    .map_err(|e| PreprocessError::Task(e.to_string()))?
            }
        }
    }
}
