//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod account;
mod auth;
mod authorizer;
mod ingest;
pub mod migration;
mod password;
mod report;
mod scans;
pub mod session;
mod status;
pub mod timeouts;

pub use account::{AccountService, MIN_SECRET_CHARS};
pub use auth::AuthService;
pub use authorizer::Authorizer;
pub use ingest::{IngestService, DEFAULT_IMAGE_FOLDER};
pub use migration::{MigrationResult, SchemaMigrator};
pub use password::SecretHasher;
pub use report::ReportService;
pub use scans::ScanQueryService;
pub use session::{SessionSigner, DEFAULT_SESSION_TTL_SECS, MIN_SECRET_LEN};
pub use status::{StatusService, StatusSummary};
pub use timeouts::Timeouts;
