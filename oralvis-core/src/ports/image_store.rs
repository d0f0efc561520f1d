//! Image store port
//!
//! The image store owns image bytes and their locator namespace. Locators
//! it hands out must resolve back to exactly the stored bytes.

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{ImageLocator, ImageUpload};

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store name for logs (e.g. "filesystem", "cloudinary")
    fn name(&self) -> &str;

    /// Durably store the bytes under a namespace hint and return a locator.
    ///
    /// Any failure is reported as `UploadFailed`.
    async fn put(&self, image: &ImageUpload, folder: &str) -> Result<ImageLocator>;

    /// Resolve a locator back to the stored bytes.
    ///
    /// Any failure is reported as `ImageUnavailable`.
    async fn fetch(&self, locator: &ImageLocator) -> Result<Vec<u8>>;
}
