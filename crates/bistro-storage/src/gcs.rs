use crate::traits::{Storage, StorageResult, StoredObject, UploadError};
use async_trait::async_trait;
use bistro_core::UploadConfig;

/// Cloud Storage media-upload client
#[derive(Clone)]
pub struct GcsStorage {
    client: reqwest::Client,
    bucket: String,
    endpoint: String,
    public_base_url: String,
}

impl GcsStorage {
    /// Create a new GcsStorage instance
    ///
    /// # Arguments
    /// * `bucket` - Bucket identifier
    /// * `endpoint` - JSON API base, e.g. "https://storage.googleapis.com"
    /// * `public_base_url` - Base for public object URLs
    pub fn new(
        bucket: impl Into<String>,
        endpoint: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            bucket: bucket.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.bucket(),
            config.storage_endpoint(),
            config.public_base_url(),
        )
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Simple media upload URL for `object_key`.
    fn upload_url(&self, object_key: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.endpoint,
            self.bucket,
            urlencoding::encode(object_key)
        )
    }
}

#[async_trait]
impl Storage for GcsStorage {
    async fn upload_with_key(
        &self,
        bearer_token: &str,
        object_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<StoredObject> {
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(self.upload_url(object_key))
            .bearer_auth(bearer_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %object_key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "GCS upload request failed"
                );
                UploadError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                bucket = %self.bucket,
                key = %object_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "GCS upload rejected"
            );
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let object: StoredObject = serde_json::from_str(&body)
            .map_err(|e| UploadError::InvalidResponse(format!("{}: {}", e, body)))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %object.name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS upload successful"
        );

        Ok(object)
    }

    fn public_url(&self, object_name: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, object_name)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const BUCKET: &str = "restaurant-images";
    const KEY: &str = "restaurants/1718000000000_k3f9zq.jpg";
    const UPLOAD_PATH: &str = "/upload/storage/v1/b/restaurant-images/o";

    #[test]
    fn test_upload_url_encodes_object_name() {
        let storage = GcsStorage::new(
            BUCKET,
            "https://storage.googleapis.com/",
            "https://storage.googleapis.com",
        );
        assert_eq!(
            storage.upload_url(KEY),
            concat!(
                "https://storage.googleapis.com/upload/storage/v1/b/restaurant-images/o",
                "?uploadType=media&name=restaurants%2F1718000000000_k3f9zq.jpg"
            )
        );
    }

    #[test]
    fn test_public_url() {
        let storage = GcsStorage::new(
            BUCKET,
            "https://storage.googleapis.com",
            "https://storage.googleapis.com/",
        );
        assert_eq!(
            storage.public_url(KEY),
            "https://storage.googleapis.com/restaurant-images/restaurants/1718000000000_k3f9zq.jpg"
        );
        assert_eq!(storage.bucket(), BUCKET);
    }

    #[tokio::test]
    async fn test_upload_sends_bytes_with_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", UPLOAD_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("uploadType".into(), "media".into()),
                Matcher::UrlEncoded("name".into(), KEY.into()),
            ]))
            .match_header("authorization", "Bearer ya29.token")
            .match_header("content-type", "image/jpeg")
            .match_body("jpeg-bytes")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                concat!(
                    r#"{{"kind":"storage#object","name":"{}","bucket":"{}","#,
                    r#""contentType":"image/jpeg","size":"10"}}"#
                ),
                KEY, BUCKET
            ))
            .create_async()
            .await;

        let storage = GcsStorage::new(BUCKET, server.url(), "https://storage.googleapis.com");
        let object = storage
            .upload_with_key("ya29.token", KEY, b"jpeg-bytes".to_vec(), "image/jpeg")
            .await
            .unwrap();

        assert_eq!(object.name, KEY);
        assert_eq!(object.bucket.as_deref(), Some(BUCKET));
        assert_eq!(object.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(object.size.as_deref(), Some("10"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_upload_keeps_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", UPLOAD_PATH)
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("insufficient permission")
            .create_async()
            .await;

        let storage = GcsStorage::new(BUCKET, server.url(), "https://storage.googleapis.com");
        let err = storage
            .upload_with_key("ya29.token", KEY, vec![1, 2, 3], "image/png")
            .await
            .unwrap_err();

        match &err {
            UploadError::Rejected { status, body } => {
                assert_eq!(*status, 403);
                assert_eq!(body, "insufficient permission");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        assert!(err.to_string().contains("insufficient permission"));
    }

    #[tokio::test]
    async fn test_success_without_name_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", UPLOAD_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"kind":"storage#object"}"#)
            .create_async()
            .await;

        let storage = GcsStorage::new(BUCKET, server.url(), "https://storage.googleapis.com");
        let err = storage
            .upload_with_key("ya29.token", KEY, vec![1], "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::InvalidResponse(_)), "got {err:?}");
    }
}
