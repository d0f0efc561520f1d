//! OralVis Core - dental scan ingestion and report pipeline
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Account, ScanRecord, Report, ...) and the error taxonomy
//! - **ports**: Trait definitions for external dependencies (AccountStore, ScanRepository, ImageStore, DocumentRenderer)
//! - **services**: Use-case orchestration (authentication, authorization, ingestion, listing, reports)
//! - **adapters**: Concrete implementations (DuckDB, filesystem, Cloudinary, lopdf)
//! - **api**: axum HTTP surface

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use adapters::cloudinary::CloudinaryImageStore;
use adapters::duckdb::DuckDbRepository;
use adapters::filesystem::FilesystemImageStore;
use adapters::memory::InMemoryImageStore;
use adapters::pdf::PdfReportRenderer;
use config::{Config, ImageStoreKind, DATABASE_FILE, IMAGES_DIR};
use ports::{DocumentRenderer, ImageStore};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{CredentialRejection, Error, Result};
pub use domain::{
    Account, AccountSummary, ImageLocator, ImageUpload, Principal, Region, Report, Role,
    ScanRecord, ScanSubmission, ScanType, SeedAccount, SessionCredential,
};

/// Everything the HTTP surface needs
///
/// Holds the shared adapters and one instance of every service, wired
/// against the same repository and image store.
pub struct OralVisContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub image_store: Arc<dyn ImageStore>,
    /// Set when images are kept on local disk and served by this process
    pub local_images: Option<Arc<FilesystemImageStore>>,
    pub authorizer: Arc<Authorizer>,
    pub auth_service: AuthService,
    pub account_service: AccountService,
    pub ingest_service: IngestService,
    pub scan_service: ScanQueryService,
    pub report_service: ReportService,
    pub status_service: StatusService,
}

impl OralVisContext {
    /// Open the data directory: load config, open the database, pick the image store
    pub fn new(data_dir: &Path, signing_secret: &[u8]) -> Result<Self> {
        Self::open(data_dir, Config::load(data_dir)?, signing_secret)
    }

    /// Like [`OralVisContext::new`] with an already loaded (possibly overridden) config
    pub fn open(data_dir: &Path, config: Config, signing_secret: &[u8]) -> Result<Self> {
        let repository = open_repository(data_dir)?;

        let (image_store, local_images) = match config.image_store.kind {
            ImageStoreKind::Filesystem => {
                let store = Arc::new(FilesystemImageStore::new(
                    data_dir.join(IMAGES_DIR),
                    &config.public_base_url,
                ));
                let shared: Arc<dyn ImageStore> = store.clone();
                (shared, Some(store))
            }
            ImageStoreKind::Cloudinary => {
                let creds = config.image_store.cloudinary_credentials()?;
                let store = CloudinaryImageStore::new(
                    creds.cloud_name.clone(),
                    creds.api_key.clone(),
                    creds.api_secret.clone(),
                    config.timeouts.image_store,
                )?;
                let shared: Arc<dyn ImageStore> = Arc::new(store);
                (shared, None)
            }
        };

        Self::with_components(
            config,
            repository,
            image_store,
            local_images,
            Arc::new(PdfReportRenderer::new()),
            signing_secret,
        )
    }

    /// In-memory database and image store; nothing touches disk
    pub fn ephemeral(config: Config, signing_secret: &[u8]) -> Result<Self> {
        let repository = Arc::new(DuckDbRepository::open_in_memory()?);
        repository.ensure_schema()?;
        Self::with_components(
            config,
            repository,
            Arc::new(InMemoryImageStore::new()),
            None,
            Arc::new(PdfReportRenderer::new()),
            signing_secret,
        )
    }

    /// Wire services over caller-supplied adapters
    pub fn with_components(
        config: Config,
        repository: Arc<DuckDbRepository>,
        image_store: Arc<dyn ImageStore>,
        local_images: Option<Arc<FilesystemImageStore>>,
        renderer: Arc<dyn DocumentRenderer>,
        signing_secret: &[u8],
    ) -> Result<Self> {
        let hasher = Arc::new(SecretHasher::new(&config.argon2)?);
        let signer = Arc::new(SessionSigner::new(signing_secret, config.session_ttl_secs)?);
        let authorizer = Arc::new(Authorizer::new(Arc::clone(&signer)));
        let timeouts = config.timeouts;

        let auth_service = AuthService::new(
            repository.clone(),
            Arc::clone(&hasher),
            Arc::clone(&signer),
            timeouts,
        );
        let account_service = AccountService::new(repository.clone(), hasher);
        let ingest_service = IngestService::new(
            Arc::clone(&authorizer),
            Arc::clone(&image_store),
            repository.clone(),
            config.image_store.folder.clone(),
            timeouts,
        );
        let scan_service = ScanQueryService::new(Arc::clone(&authorizer), repository.clone(), timeouts);
        let report_service = ReportService::new(
            Arc::clone(&authorizer),
            repository.clone(),
            Arc::clone(&image_store),
            renderer,
            timeouts,
        );
        let status_service = StatusService::new(repository.clone(), repository.clone());

        Ok(Self {
            config,
            repository,
            image_store,
            local_images,
            authorizer,
            auth_service,
            account_service,
            ingest_service,
            scan_service,
            report_service,
            status_service,
        })
    }
}

/// Operator context: provisioning and status, no signing secret needed
pub struct AdminContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub account_service: AccountService,
    pub status_service: StatusService,
}

impl AdminContext {
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let repository = open_repository(data_dir)?;
        let hasher = Arc::new(SecretHasher::new(&config.argon2)?);

        Ok(Self {
            account_service: AccountService::new(repository.clone(), hasher),
            status_service: StatusService::new(repository.clone(), repository.clone()),
            config,
            repository,
        })
    }
}

fn open_repository(data_dir: &Path) -> Result<Arc<DuckDbRepository>> {
    let repository = Arc::new(DuckDbRepository::new(&data_dir.join(DATABASE_FILE))?);
    repository.ensure_schema()?;
    Ok(repository)
}
