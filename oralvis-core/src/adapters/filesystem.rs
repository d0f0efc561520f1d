//! Local filesystem image store
//!
//! Images live under `<root>/<folder>/<uuid>.<ext>`. Locators are public
//! URLs of the form `<public_base_url>/images/<folder>/<file>`, which the
//! HTTP surface serves back from the same directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{ImageLocator, ImageUpload};
use crate::ports::ImageStore;

/// URL path prefix under which stored images are served
pub const IMAGE_ROUTE_PREFIX: &str = "/images";

pub struct FilesystemImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl FilesystemImageStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a stored object by its folder and file name.
    ///
    /// Both parts must be single plain path segments.
    pub async fn read_object(&self, folder: &str, file: &str) -> Result<Vec<u8>> {
        if !is_safe_segment(folder) || !is_safe_segment(file) {
            return Err(Error::image_unavailable("invalid image path"));
        }
        let path = self.root.join(folder).join(file);
        tokio::fs::read(&path).await.map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "image read failed");
            Error::image_unavailable(format!("image {}/{} not readable", folder, file))
        })
    }

    /// Split a locator into (folder, file) if it belongs to this store
    fn parse_locator<'a>(&self, locator: &'a ImageLocator) -> Option<(&'a str, &'a str)> {
        let rest = locator
            .as_str()
            .strip_prefix(self.public_base_url.as_str())?
            .strip_prefix(IMAGE_ROUTE_PREFIX)?
            .strip_prefix('/')?;
        rest.split_once('/')
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn put(&self, image: &ImageUpload, folder: &str) -> Result<ImageLocator> {
        if !is_safe_segment(folder) {
            return Err(Error::upload_failed(format!("invalid folder name: {}", folder)));
        }

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::upload_failed(format!("cannot create image directory: {}", e)))?;

        let file = format!("{}.{}", Uuid::new_v4(), image.extension());
        let path = dir.join(&file);
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|e| Error::upload_failed(format!("cannot write image: {}", e)))?;

        Ok(ImageLocator::new(format!(
            "{}{}/{}/{}",
            self.public_base_url, IMAGE_ROUTE_PREFIX, folder, file
        )))
    }

    async fn fetch(&self, locator: &ImageLocator) -> Result<Vec<u8>> {
        let (folder, file) = self
            .parse_locator(locator)
            .ok_or_else(|| Error::image_unavailable("locator does not belong to this store"))?;
        self.read_object(folder, file).await
    }
}
