/// Media Upload Client
///
/// Pushes user images to the remote media store and returns the public URL
/// it assigns. The auth core only sees the `MediaUploader` trait.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

use crate::configuration::MediaSettings;

/// An uploaded file held in memory
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadError(pub String);

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Upload failed: {}", self.0)
    }
}

impl std::error::Error for UploadError {}

#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Stores `file` under `folder` and returns its stable URL.
    async fn upload(&self, folder: &str, file: MediaFile) -> Result<String, UploadError>;
}

#[derive(Clone)]
pub struct HttpMediaUploader {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpMediaUploader {
    pub fn new(settings: &MediaSettings) -> Result<Self, UploadError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| UploadError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl MediaUploader for HttpMediaUploader {
    async fn upload(&self, folder: &str, file: MediaFile) -> Result<String, UploadError> {
        let url = format!("{}/upload/{}", self.base_url, folder);

        let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| UploadError(format!("Invalid content type: {}", e)))?;
        }
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach media store: {}", e);
                UploadError(format!("Failed to reach media store: {}", e))
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("Media store returned error: {}", e);
                UploadError(format!("Media store error: {}", e))
            })?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError(format!("Unexpected media store response: {}", e)))?;

        tracing::debug!(folder = folder, url = %body.url, "Media uploaded");
        Ok(body.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn uploader(base_url: String) -> HttpMediaUploader {
        HttpMediaUploader::new(&MediaSettings {
            base_url,
            api_key: "media-key".to_string(),
            timeout_milliseconds: 2_000,
        })
        .unwrap()
    }

    fn file() -> MediaFile {
        MediaFile {
            file_name: "avatar.png".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[tokio::test]
    async fn test_upload_returns_url_from_media_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/avatars"))
            .and(header("authorization", "Bearer media-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://cdn.test/avatars/avatar.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = uploader(server.uri()).upload("avatars", file()).await.unwrap();

        assert_eq!(url, "https://cdn.test/avatars/avatar.png");
    }

    #[tokio::test]
    async fn test_upload_fails_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = uploader(server.uri()).upload("avatars", file()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_upload_fails_on_unexpected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let result = uploader(server.uri()).upload("avatars", file()).await;

        assert!(result.is_err());
    }
}
