//! Property image uploads to object storage
//!
//! Objects are written to `{bucket}/{contract address}/{filename}` through
//! the storage REST API and served from the bucket's public URL.

use reqwest::Client;
use tracing::{error, info};

use crate::models::address::NormalizedAddress;

pub const DEFAULT_BUCKET: &str = "property-images";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Storage API error {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Clone)]
pub struct ImageStorage {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl ImageStorage {
    pub fn new(base_url: String, service_key: String, bucket: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        }
    }

    /// Object path inside the bucket
    pub fn object_path(address: &NormalizedAddress, filename: &str) -> Result<String, StorageError> {
        let filename = filename.trim();
        let valid = !filename.is_empty()
            && filename.len() <= 128
            && !filename.starts_with('.')
            && filename
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

        if !valid {
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }

        Ok(format!("{}/{}", address, filename))
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, path)
    }

    /// Upload image bytes and return the public URL
    pub async fn upload(
        &self,
        address: &NormalizedAddress,
        filename: &str,
        content_type: &str,
        bytes: axum::body::Bytes,
    ) -> Result<String, StorageError> {
        if !content_type.starts_with("image/") {
            return Err(StorageError::UnsupportedContentType(content_type.to_string()));
        }

        let path = Self::object_path(address, filename)?;
        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, path);
        let size = bytes.len();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!(status = status, path = %path, "Image upload rejected by storage");
            return Err(StorageError::Api { status, body });
        }

        info!(path = %path, bytes = size, "Uploaded property image");
        Ok(self.public_url(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> NormalizedAddress {
        NormalizedAddress::parse("0xABABABABABABABABABABABABABABABABABABABAB").unwrap()
    }

    #[test]
    fn test_object_path() {
        let path = ImageStorage::object_path(&address(), "front-view_1.jpg").unwrap();
        assert_eq!(path, "0xabababababababababababababababababababab/front-view_1.jpg");
    }

    #[test]
    fn test_object_path_rejects_traversal() {
        assert!(ImageStorage::object_path(&address(), "../secret.jpg").is_err());
        assert!(ImageStorage::object_path(&address(), ".hidden").is_err());
        assert!(ImageStorage::object_path(&address(), "a/b.jpg").is_err());
        assert!(ImageStorage::object_path(&address(), "").is_err());
    }

    #[test]
    fn test_public_url() {
        let storage = ImageStorage::new(
            "https://project.supabase.co/storage/v1/".to_string(),
            "key".to_string(),
            DEFAULT_BUCKET.to_string(),
        );
        assert_eq!(
            storage.public_url("0xab/a.jpg"),
            "https://project.supabase.co/storage/v1/object/public/property-images/0xab/a.jpg"
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let storage = ImageStorage::new(
            "http://127.0.0.1:9".to_string(),
            "key".to_string(),
            DEFAULT_BUCKET.to_string(),
        );
        let err = storage
            .upload(&address(), "a.pdf", "application/pdf", axum::body::Bytes::from_static(b"%PDF"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedContentType(_)));
    }
}
