//! Schema migrations for the OralVis database
//!
//! Each embedded migration runs in its own transaction together with the
//! `sys_migrations` row that records it, so a failed migration leaves neither
//! a half-built schema nor a bookkeeping entry behind.

use duckdb::Connection;

use crate::domain::result::{Error, Result};
use crate::migrations::MIGRATIONS;

/// Bookkeeping table, created before anything else is looked up
const BOOKKEEPING: &str = "000_migrations.sql";

/// Outcome of a migration run
#[derive(Debug)]
pub struct MigrationResult {
    /// Migrations applied by this run, in order
    pub applied: Vec<String>,
    /// Migrations found already recorded
    pub already_applied: usize,
}

pub struct SchemaMigrator<'a> {
    conn: &'a mut Connection,
}

impl<'a> SchemaMigrator<'a> {
    pub fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }

    /// Apply every embedded migration not yet recorded
    pub fn run_pending(&mut self) -> Result<MigrationResult> {
        self.apply_all(MIGRATIONS)
    }

    fn apply_all(&mut self, migrations: &[(&str, &str)]) -> Result<MigrationResult> {
        let mut applied = Vec::new();

        let bookkeeping_sql = migrations
            .iter()
            .find(|(name, _)| *name == BOOKKEEPING)
            .map(|(_, sql)| *sql)
            .ok_or_else(|| Error::storage("migration bookkeeping table is not embedded"))?;
        if !self.bookkeeping_exists()? {
            self.apply(BOOKKEEPING, bookkeeping_sql)?;
            applied.push(BOOKKEEPING.to_string());
        }

        let recorded = self.recorded()?;
        let already_applied = recorded.len() - applied.len();

        for (name, sql) in migrations {
            if recorded.iter().any(|r| r == name) {
                continue;
            }
            self.apply(name, sql)?;
            tracing::debug!(migration = *name, "applied migration");
            applied.push(name.to_string());
        }

        Ok(MigrationResult {
            applied,
            already_applied,
        })
    }

    fn apply(&mut self, name: &str, sql: &str) -> Result<()> {
        let failed = |e: duckdb::Error| Error::storage(format!("migration {} failed: {}", name, e));

        let tx = self.conn.transaction().map_err(failed)?;
        tx.execute_batch(sql).map_err(failed)?;
        tx.execute(
            "INSERT INTO sys_migrations (migration_name) VALUES (?)",
            [name],
        )
        .map_err(failed)?;
        tx.commit().map_err(failed)
    }

    fn bookkeeping_exists(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'sys_migrations'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn recorded(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT migration_name FROM sys_migrations ORDER BY migration_name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }
}
