//! Image storage for post preview images
//!
//! Uploads go to Cloudinary as unsigned uploads. When storage is not
//! configured, [`DisabledImageStorage`] refuses every upload and callers
//! save the post without an image.

use crate::config::StorageConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Largest accepted preview image
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Accepted preview image content types
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Image file received from a client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Check size and content type before any upload is attempted
    pub fn validate(&self) -> Result<(), String> {
        if !ALLOWED_IMAGE_TYPES.contains(&self.content_type.as_str()) {
            return Err("Only JPEG, PNG and WEBP images are allowed".to_string());
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err("Image must be 2MB or smaller".to_string());
        }
        if self.bytes.is_empty() {
            return Err("Image file is empty".to_string());
        }
        Ok(())
    }
}

/// Object storage that turns an image into a public URL
#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<String>;
}

/// Storage used when no backend is configured
pub struct DisabledImageStorage;

#[async_trait]
impl ImageStorage for DisabledImageStorage {
    async fn upload(&self, _image: ImageUpload) -> Result<String> {
        anyhow::bail!("Image storage is not configured")
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Cloudinary unsigned-upload client
pub struct CloudinaryStorage {
    client: reqwest::Client,
    endpoint: String,
    upload_preset: String,
    folder: String,
}

impl CloudinaryStorage {
    pub fn new(config: &StorageConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: format!(
                "{}/v1_1/{}/image/upload",
                config.api_base.trim_end_matches('/'),
                config.cloud_name
            ),
            upload_preset: config.upload_preset.clone(),
            folder: config.folder.clone(),
        }
    }
}

#[async_trait]
impl ImageStorage for CloudinaryStorage {
    async fn upload(&self, image: ImageUpload) -> Result<String> {
        let size = image.bytes.len();
        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;

        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", self.folder.clone())
            .part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .context("image upload request failed")?
            .error_for_status()
            .context("image upload rejected")?;

        let body: UploadResponse = response
            .json()
            .await
            .context("unexpected image upload response")?;

        debug!(size, url = %body.secure_url, "Image uploaded");
        Ok(body.secure_url)
    }
}

/// Pick the storage backend described by configuration
pub fn image_storage_from_config(config: &StorageConfig) -> Arc<dyn ImageStorage> {
    if config.enabled {
        Arc::new(CloudinaryStorage::new(config))
    } else {
        Arc::new(DisabledImageStorage)
    }
}
