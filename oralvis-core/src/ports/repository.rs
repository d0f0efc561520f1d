//! Repository ports - persistence abstraction

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{Account, NewScan, ScanRecord};

/// Credential store
///
/// Holds provisioned accounts. Reads are independently atomic; the pipeline
/// never mutates accounts, only provisioning does.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account by its normalized identity
    async fn find_account(&self, identity: &str) -> Result<Option<Account>>;

    /// Insert a new account. Fails with `Conflict` if the identity exists.
    async fn create_account(&self, account: &Account) -> Result<()>;

    /// All accounts, ordered by identity
    async fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Remove every account, returning how many were removed
    async fn delete_all_accounts(&self) -> Result<usize>;
}

/// Scan repository
///
/// Single source of truth for scan metadata. Records are insert-only.
#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// Persist a scan; the identifier is assigned atomically by the insert
    async fn insert_scan(&self, scan: NewScan) -> Result<ScanRecord>;

    /// Look up a scan by identifier
    async fn get_scan(&self, id: i64) -> Result<Option<ScanRecord>>;

    /// All scans, newest upload first, ties broken by identifier descending
    async fn list_scans(&self) -> Result<Vec<ScanRecord>>;

    /// Number of persisted scans
    async fn count_scans(&self) -> Result<i64>;
}
