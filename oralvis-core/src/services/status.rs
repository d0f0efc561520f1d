//! Status service - account and scan summaries for operators

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::Role;
use crate::ports::{AccountStore, ScanRepository};

pub struct StatusService {
    accounts: Arc<dyn AccountStore>,
    scans: Arc<dyn ScanRepository>,
}

impl StatusService {
    pub fn new(accounts: Arc<dyn AccountStore>, scans: Arc<dyn ScanRepository>) -> Self {
        Self { accounts, scans }
    }

    pub async fn get_status(&self) -> Result<StatusSummary> {
        let accounts = self.accounts.list_accounts().await?;
        let total_scans = self.scans.count_scans().await?;
        let latest_upload = self
            .scans
            .list_scans()
            .await?
            .first()
            .map(|s| s.uploaded_at);

        let count_role = |role: Role| accounts.iter().filter(|a| a.role == role).count() as i64;

        Ok(StatusSummary {
            total_accounts: accounts.len() as i64,
            technicians: count_role(Role::Technician),
            dentists: count_role(Role::Dentist),
            total_scans,
            latest_upload,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_accounts: i64,
    pub technicians: i64,
    pub dentists: i64,
    pub total_scans: i64,
    pub latest_upload: Option<DateTime<Utc>>,
}
