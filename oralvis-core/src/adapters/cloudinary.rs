//! Cloudinary image store
//!
//! Uploads go through the signed upload API as a base64 data URI; the
//! returned `secure_url` is the locator. Fetching is a plain GET of it.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::domain::result::{Error, Result};
use crate::domain::{ImageLocator, ImageUpload};
use crate::ports::ImageStore;

pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct CloudinaryImageStore {
    http: reqwest::Client,
    api_base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryImageStore {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        })
    }

    /// Point at a different API host (tests use a local mock server)
    pub fn with_api_base_url(mut self, base: &str) -> Self {
        self.api_base_url = base.trim_end_matches('/').to_string();
        self
    }

    fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/image/upload", self.api_base_url, self.cloud_name)
    }

    /// Hex SHA-256 over the sorted signed parameters followed by the secret
    fn sign(&self, folder: &str, timestamp: i64) -> String {
        let to_sign = format!("folder={}&timestamp={}{}", folder, timestamp, self.api_secret);
        hex::encode(Sha256::digest(to_sign.as_bytes()))
    }
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    fn name(&self) -> &str {
        "cloudinary"
    }

    async fn put(&self, image: &ImageUpload, folder: &str) -> Result<ImageLocator> {
        let timestamp = Utc::now().timestamp();
        let data_uri = format!(
            "data:{};base64,{}",
            image.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&image.bytes)
        );
        let timestamp_str = timestamp.to_string();
        let signature = self.sign(folder, timestamp);

        let form = [
            ("file", data_uri.as_str()),
            ("folder", folder),
            ("timestamp", timestamp_str.as_str()),
            ("api_key", self.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let resp = self
            .http
            .post(self.upload_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::upload_failed(format!("cloudinary request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let message = match resp.json::<ErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => String::from("no error detail"),
            };
            return Err(Error::upload_failed(format!(
                "cloudinary rejected upload ({}): {}",
                status, message
            )));
        }

        let body: UploadResponse = resp
            .json()
            .await
            .map_err(|e| Error::upload_failed(format!("unexpected cloudinary response: {}", e)))?;
        Ok(ImageLocator::new(body.secure_url))
    }

    async fn fetch(&self, locator: &ImageLocator) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(locator.as_str())
            .send()
            .await
            .map_err(|e| Error::image_unavailable(format!("image request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(Error::image_unavailable(format!(
                "image host returned {}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::image_unavailable(format!("image download interrupted: {}", e)))?;
        Ok(bytes.to_vec())
    }
}
