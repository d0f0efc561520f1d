//! CLI command implementations

pub mod account;
pub mod serve;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use oralvis_core::AdminContext;

/// Get the data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("ORALVIS_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory; set ORALVIS_DIR")?;
    Ok(home.join(".oralvis"))
}

/// Create the data directory if needed and return it
pub fn ensure_data_dir() -> Result<PathBuf> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
    Ok(data_dir)
}

/// Open the operator context (database + provisioning, no signing secret)
pub fn get_admin_context() -> Result<AdminContext> {
    let data_dir = ensure_data_dir()?;
    AdminContext::new(&data_dir).context("Failed to open OralVis data directory")
}
