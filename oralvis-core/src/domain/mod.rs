//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
pub mod password;
pub mod report;
pub mod result;
mod scan;
mod session;
mod user;

pub use account::{Account, AccountSummary, Role, SeedAccount};
pub use password::Argon2Params;
pub use report::{Report, ReportFields};
pub use scan::{
    upload_timestamp_now, ImageLocator, ImageUpload, NewScan, Region, ScanMetadata, ScanRecord,
    ScanSubmission, ScanType,
};
pub use session::{SessionClaims, SessionCredential};
pub use user::Principal;
