//! Scan listing for dentists

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::{Role, ScanRecord};
use crate::ports::ScanRepository;
use crate::services::{timeouts, Authorizer, Timeouts};

pub struct ScanQueryService {
    authorizer: Arc<Authorizer>,
    scans: Arc<dyn ScanRepository>,
    timeouts: Timeouts,
}

impl ScanQueryService {
    pub fn new(authorizer: Arc<Authorizer>, scans: Arc<dyn ScanRepository>, timeouts: Timeouts) -> Self {
        Self {
            authorizer,
            scans,
            timeouts,
        }
    }

    /// All scans, newest first (ties: higher id first)
    pub async fn list_scans(&self, credential: Option<&str>) -> Result<Vec<ScanRecord>> {
        self.authorizer.authorize(credential, Role::Dentist)?;
        let scans = timeouts::storage(self.timeouts.storage, self.scans.list_scans()).await?;
        tracing::debug!(count = scans.len(), "scans listed");
        Ok(scans)
    }
}
