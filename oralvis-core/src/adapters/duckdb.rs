//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::{params, Connection};

use crate::domain::result::{Error, Result};
use crate::domain::{Account, ImageLocator, NewScan, Role, ScanRecord};
use crate::ports::{AccountStore, ScanRepository};
use crate::services::{MigrationResult, SchemaMigrator};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

fn is_duplicate_key_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("duplicate key") || lower.contains("unique constraint")
}

/// DuckDB repository implementation
///
/// One connection behind a mutex; async port methods run their statements on
/// tokio's blocking pool so the executor never waits on storage I/O.
pub struct DuckDbRepository {
    conn: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
}

impl DuckDbRepository {
    /// Open (or create) the database file
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which occur when the CLI and a running server open the same file.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Arc::new(Mutex::new(conn)),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            delay_ms = delay.as_millis() as u64,
                            "database busy, retrying: {}",
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.map(Error::from).unwrap_or_else(|| {
            Error::storage(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// In-memory database, used by tests and throwaway demos
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading stays off; nothing here needs extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    /// Path of the database file, if file-backed
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Apply pending schema migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let mut conn = self.lock()?;
        SchemaMigrator::new(&mut conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        let result = self.run_migrations()?;
        if !result.applied.is_empty() {
            tracing::info!(applied = ?result.applied, "database schema upgraded");
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::storage("database connection mutex poisoned"))
    }

    /// Run a blocking storage operation on the blocking pool
    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| Error::storage("database connection mutex poisoned"))?;
            op(&guard)
        })
        .await
        .map_err(|e| Error::storage(format!("storage task failed: {}", e)))?
    }
}

// === Account operations ===

const ACCOUNT_COLUMNS: &str = "identity, secret_hash, role, created_at";

fn query_accounts(conn: &Connection, sql: &str, args: &[&dyn duckdb::ToSql]) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut accounts = Vec::new();
    for row in rows {
        let (identity, secret_hash, role, created_at) = row?;
        let role: Role = role
            .parse()
            .map_err(|_| Error::storage(format!("unknown role stored for account: {}", role)))?;
        accounts.push(Account {
            identity,
            secret_hash,
            role,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(accounts)
}

fn insert_account(conn: &Connection, account: &Account) -> Result<()> {
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sys_users WHERE identity = ?",
        params![account.identity],
        |row| row.get(0),
    )?;
    if exists > 0 {
        return Err(Error::Conflict(format!(
            "account already exists: {}",
            account.identity
        )));
    }

    conn.execute(
        "INSERT INTO sys_users (identity, secret_hash, role, created_at) VALUES (?, ?, ?, ?)",
        params![
            account.identity,
            account.secret_hash,
            account.role.as_str(),
            format_timestamp(&account.created_at),
        ],
    )
    .map_err(|e| {
        let msg = e.to_string();
        if is_duplicate_key_error(&msg) {
            Error::Conflict(format!("account already exists: {}", account.identity))
        } else {
            Error::from(e)
        }
    })?;
    Ok(())
}

#[async_trait]
impl AccountStore for DuckDbRepository {
    async fn find_account(&self, identity: &str) -> Result<Option<Account>> {
        let identity = identity.to_string();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM sys_users WHERE identity = ?", ACCOUNT_COLUMNS);
            Ok(query_accounts(conn, &sql, &[&identity])?.into_iter().next())
        })
        .await
    }

    async fn create_account(&self, account: &Account) -> Result<()> {
        let account = account.clone();
        self.with_conn(move |conn| insert_account(conn, &account)).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM sys_users ORDER BY identity", ACCOUNT_COLUMNS);
            query_accounts(conn, &sql, &[])
        })
        .await
    }

    async fn delete_all_accounts(&self) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM sys_users", [])?))
            .await
    }
}

// === Scan operations ===

const SCAN_COLUMNS: &str =
    "scan_id, patient_name, patient_id, scan_type, region, image_locator, uploaded_at";

fn query_scans(conn: &Connection, sql: &str, args: &[&dyn duckdb::ToSql]) -> Result<Vec<ScanRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut scans = Vec::new();
    for row in rows {
        let (id, patient_name, patient_id, scan_type, region, locator, uploaded_at) = row?;
        scans.push(ScanRecord {
            id,
            patient_name,
            patient_id,
            scan_type: scan_type
                .parse()
                .map_err(|_| Error::storage(format!("scan {} has unknown scan type", id)))?,
            region: region
                .parse()
                .map_err(|_| Error::storage(format!("scan {} has unknown region", id)))?,
            image_locator: ImageLocator::new(locator),
            uploaded_at: parse_timestamp(&uploaded_at)?,
        });
    }
    Ok(scans)
}

#[async_trait]
impl ScanRepository for DuckDbRepository {
    async fn insert_scan(&self, scan: NewScan) -> Result<ScanRecord> {
        self.with_conn(move |conn| {
            let id: i64 = conn.query_row(
                "INSERT INTO sys_scans (patient_name, patient_id, scan_type, region, image_locator, uploaded_at)
                 VALUES (?, ?, ?, ?, ?, ?)
                 RETURNING scan_id",
                params![
                    scan.metadata.patient_name,
                    scan.metadata.patient_id,
                    scan.metadata.scan_type.as_str(),
                    scan.metadata.region.as_str(),
                    scan.image_locator.as_str(),
                    format_timestamp(&scan.uploaded_at),
                ],
                |row| row.get(0),
            )?;
            Ok(ScanRecord::from_new(id, scan))
        })
        .await
    }

    async fn get_scan(&self, id: i64) -> Result<Option<ScanRecord>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM sys_scans WHERE scan_id = ?", SCAN_COLUMNS);
            Ok(query_scans(conn, &sql, &[&id])?.into_iter().next())
        })
        .await
    }

    async fn list_scans(&self) -> Result<Vec<ScanRecord>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM sys_scans ORDER BY uploaded_at DESC, scan_id DESC",
                SCAN_COLUMNS
            );
            query_scans(conn, &sql, &[])
        })
        .await
    }

    async fn count_scans(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM sys_scans", [], |row| row.get(0))?)
        })
        .await
    }
}

// Helper functions

/// Fixed microsecond precision so text order equals chronological order
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::storage(format!("invalid stored timestamp {:?}: {}", s, e)))
}
