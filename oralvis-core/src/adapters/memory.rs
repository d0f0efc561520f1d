//! In-memory image store
//!
//! Used by tests and by `serve --ephemeral`. Failure switches let tests
//! simulate an unreachable store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::result::{Error, Result};
use crate::domain::{ImageLocator, ImageUpload};
use crate::ports::ImageStore;

#[derive(Default)]
pub struct InMemoryImageStore {
    images: Mutex<HashMap<String, Vec<u8>>>,
    next_id: AtomicU64,
    fail_puts: AtomicBool,
    fail_fetches: AtomicBool,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Number of stored images
    pub fn len(&self) -> usize {
        self.images.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop a stored image so later fetches of its locator fail
    pub fn remove(&self, locator: &ImageLocator) -> bool {
        self.images
            .lock()
            .map(|mut m| m.remove(locator.as_str()).is_some())
            .unwrap_or(false)
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, image: &ImageUpload, folder: &str) -> Result<ImageLocator> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::upload_failed("image store unreachable"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let key = format!("memory://{}/{}.{}", folder, id, image.extension());
        self.images
            .lock()
            .map_err(|_| Error::upload_failed("image store lock poisoned"))?
            .insert(key.clone(), image.bytes.clone());
        Ok(ImageLocator::new(key))
    }

    async fn fetch(&self, locator: &ImageLocator) -> Result<Vec<u8>> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(Error::image_unavailable("image store unreachable"));
        }
        self.images
            .lock()
            .map_err(|_| Error::image_unavailable("image store lock poisoned"))?
            .get(locator.as_str())
            .cloned()
            .ok_or_else(|| Error::image_unavailable(format!("no image at {}", locator)))
    }
}
