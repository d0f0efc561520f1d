//! Deadlines for calls that leave the process

use std::future::Future;
use std::time::Duration;

use crate::domain::result::{Error, Result};

pub const DEFAULT_IMAGE_STORE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub image_store: Duration,
    pub storage: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            image_store: DEFAULT_IMAGE_STORE_TIMEOUT,
            storage: DEFAULT_STORAGE_TIMEOUT,
        }
    }
}

/// Await `fut`, converting an elapsed deadline into the error from `on_elapsed`
pub(crate) async fn bounded<T, F, E>(limit: Duration, fut: F, on_elapsed: E) -> Result<T>
where
    F: Future<Output = Result<T>>,
    E: FnOnce() -> Error,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_elapsed()),
    }
}

/// Storage calls that overrun become `Storage` errors
pub(crate) async fn storage<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    bounded(limit, fut, || Error::storage("storage operation timed out")).await
}
