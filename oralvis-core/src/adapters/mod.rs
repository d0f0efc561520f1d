//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the AccountStore and ScanRepository ports
//! - Local filesystem and Cloudinary for the ImageStore port
//! - In-memory ImageStore for tests and ephemeral servers
//! - lopdf for the DocumentRenderer port

pub mod cloudinary;
pub mod duckdb;
pub mod filesystem;
pub mod memory;
pub mod pdf;
