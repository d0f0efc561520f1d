//! Integration tests for oralvis-core services
//!
//! These tests exercise the pipeline end to end using real DuckDB and the
//! real PDF renderer. The image store is an in-memory fake (or a
//! deliberately broken one) so store failures can be simulated.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use image::{ImageFormat, Rgb, RgbImage};

use oralvis_core::adapters::duckdb::DuckDbRepository;
use oralvis_core::adapters::memory::InMemoryImageStore;
use oralvis_core::adapters::pdf::PdfReportRenderer;
use oralvis_core::config::Config;
use oralvis_core::domain::Argon2Params;
use oralvis_core::ports::{ImageStore, ScanRepository};
use oralvis_core::services::Timeouts;
use oralvis_core::{
    CredentialRejection, Error, ImageLocator, ImageUpload, OralVisContext, Role, ScanSubmission,
    SeedAccount,
};

const SECRET: &[u8] = b"integration-test-signing-secret-0123456789";

// ============================================================================
// Test Helpers
// ============================================================================

fn test_config() -> Config {
    let mut config = Config::default();
    config.argon2 = Argon2Params::insecure_fast();
    config.seed_accounts = vec![
        SeedAccount {
            identity: "tech@example.com".into(),
            secret: "secret1".into(),
            role: Role::Technician,
        },
        SeedAccount {
            identity: "doc@example.com".into(),
            secret: "secret2".into(),
            role: Role::Dentist,
        },
    ];
    config
}

/// Context over an in-memory database, the given image store and the PDF renderer
async fn create_context(images: Arc<dyn ImageStore>, config: Config) -> OralVisContext {
    let repo = Arc::new(DuckDbRepository::open_in_memory().expect("Failed to open database"));
    repo.ensure_schema().expect("Failed to initialize schema");
    let ctx = OralVisContext::with_components(
        config,
        repo,
        images,
        None,
        Arc::new(PdfReportRenderer::new()),
        SECRET,
    )
    .expect("Failed to build context");
    let seeds = ctx.config.seed_accounts.clone();
    ctx.account_service.seed(&seeds).await.expect("Failed to seed accounts");
    ctx
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 128]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn submission(patient_id: &str) -> ScanSubmission {
    ScanSubmission {
        patient_name: Some("Jane Doe".into()),
        patient_id: Some(patient_id.into()),
        scan_type: Some("Intraoral Scan".into()),
        region: Some("Full Mouth".into()),
    }
}

async fn login(ctx: &OralVisContext, identity: &str, secret: &str) -> String {
    ctx.auth_service
        .authenticate(identity, secret)
        .await
        .expect("login failed")
        .token
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle.as_bytes())
}

/// Image store that never answers in time
struct StalledImageStore;

#[async_trait]
impl ImageStore for StalledImageStore {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn put(&self, _image: &ImageUpload, _folder: &str) -> oralvis_core::Result<ImageLocator> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ImageLocator::new("never"))
    }

    async fn fetch(&self, _locator: &ImageLocator) -> oralvis_core::Result<Vec<u8>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// Image store that fails with a non-upload error kind
struct BrokenImageStore;

#[async_trait]
impl ImageStore for BrokenImageStore {
    fn name(&self) -> &str {
        "broken"
    }

    async fn put(&self, _image: &ImageUpload, _folder: &str) -> oralvis_core::Result<ImageLocator> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }

    async fn fetch(&self, _locator: &ImageLocator) -> oralvis_core::Result<Vec<u8>> {
        Err(Error::image_unavailable("broken"))
    }
}

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_seeded_accounts_get_credentials_with_their_role() {
    let ctx = create_context(Arc::new(InMemoryImageStore::new()), test_config()).await;

    for (identity, secret, role) in [
        ("tech@example.com", "secret1", Role::Technician),
        ("doc@example.com", "secret2", Role::Dentist),
    ] {
        let cred = ctx.auth_service.authenticate(identity, secret).await.unwrap();
        assert_eq!(cred.role, role);
        let principal = ctx.authorizer.authorize(Some(&cred.token), role).unwrap();
        assert_eq!(principal.identity, identity);
    }
}

#[tokio::test]
async fn test_login_failures_share_one_shape() {
    let ctx = create_context(Arc::new(InMemoryImageStore::new()), test_config()).await;

    let attempts = [
        ("tech@example.com", "wrong"),
        ("tech@example.com", ""),
        ("doc@example.com", "secret1"),
        ("nobody@example.com", "secret1"),
        ("", ""),
    ];
    for (identity, secret) in attempts {
        let err = ctx.auth_service.authenticate(identity, secret).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials), "{} / {}", identity, secret);
        assert_eq!(err.code(), "invalid_credentials");
        assert_eq!(err.to_string(), "Invalid credentials");
    }
}

#[tokio::test]
async fn test_authorize_cross_product() {
    let ctx = create_context(Arc::new(InMemoryImageStore::new()), test_config()).await;
    let signer = oralvis_core::services::SessionSigner::new(SECRET, 3600).unwrap();

    let valid = login(&ctx, "doc@example.com", "secret2").await;
    let expired = signer
        .issue_at("doc@example.com", Role::Dentist, Utc::now() - chrono::Duration::hours(2))
        .unwrap()
        .token;
    // Swap the payload for one claiming a different role, keep the signature
    let forged_claims = signer.issue("doc@example.com", Role::Technician).unwrap().token;
    let tampered = {
        let parts: Vec<&str> = valid.split('.').collect();
        let forged: Vec<&str> = forged_claims.split('.').collect();
        format!("{}.{}.{}", parts[0], forged[1], parts[2])
    };

    // valid x {matching, mismatched}
    assert!(ctx.authorizer.authorize(Some(&valid), Role::Dentist).is_ok());
    assert!(matches!(
        ctx.authorizer.authorize(Some(&valid), Role::Technician),
        Err(Error::Forbidden { .. })
    ));

    // {tampered, expired} x {matching, mismatched}
    for required in [Role::Dentist, Role::Technician] {
        assert!(matches!(
            ctx.authorizer.authorize(Some(&tampered), required),
            Err(Error::Unauthenticated(CredentialRejection::BadSignature))
        ));
        assert!(matches!(
            ctx.authorizer.authorize(Some(&expired), required),
            Err(Error::Unauthenticated(CredentialRejection::Expired))
        ));
    }
}

// ============================================================================
// Ingestion Tests
// ============================================================================

#[tokio::test]
async fn test_store_failures_never_persist_a_record() {
    let memory = Arc::new(InMemoryImageStore::new());
    memory.set_fail_puts(true);

    let mut quick = test_config();
    quick.timeouts = Timeouts {
        image_store: Duration::from_millis(50),
        storage: Duration::from_secs(10),
    };

    let failing: Arc<dyn ImageStore> = memory;
    let stalled: Arc<dyn ImageStore> = Arc::new(StalledImageStore);
    let broken: Arc<dyn ImageStore> = Arc::new(BrokenImageStore);
    let stores = vec![
        (failing, test_config()),
        (stalled, quick),
        (broken, test_config()),
    ];

    for (store, config) in stores {
        let name = store.name().to_string();
        let ctx = create_context(store, config).await;
        let tech = login(&ctx, "tech@example.com", "secret1").await;

        let result = ctx
            .ingest_service
            .ingest(Some(&tech), &submission("P-001"), Some(ImageUpload::new(png_bytes(4, 4))))
            .await;
        assert!(matches!(result, Err(Error::UploadFailed(_))), "store {}", name);
        assert_eq!(ctx.repository.count_scans().await.unwrap(), 0, "store {}", name);
    }
}

#[tokio::test]
async fn test_newest_ingest_is_listed_first() {
    let ctx = create_context(Arc::new(InMemoryImageStore::new()), test_config()).await;
    let tech = login(&ctx, "tech@example.com", "secret1").await;
    let doc = login(&ctx, "doc@example.com", "secret2").await;

    let mut last_id = 0;
    for patient in ["P-001", "P-002", "P-003"] {
        let record = ctx
            .ingest_service
            .ingest(Some(&tech), &submission(patient), Some(ImageUpload::new(png_bytes(2, 2))))
            .await
            .unwrap();
        last_id = record.id;

        let listed = ctx.scan_service.list_scans(Some(&doc)).await.unwrap();
        assert_eq!(listed[0].id, record.id);
        assert_eq!(listed[0].patient_id, patient);
    }

    let listed = ctx.scan_service.list_scans(Some(&doc)).await.unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].id, last_id);
    assert!(listed
        .windows(2)
        .all(|w| (w[0].uploaded_at, w[0].id) > (w[1].uploaded_at, w[1].id)));
}

#[tokio::test]
async fn test_roles_are_enforced_on_each_operation() {
    let ctx = create_context(Arc::new(InMemoryImageStore::new()), test_config()).await;
    let tech = login(&ctx, "tech@example.com", "secret1").await;
    let doc = login(&ctx, "doc@example.com", "secret2").await;

    assert!(matches!(
        ctx.scan_service.list_scans(Some(&tech)).await,
        Err(Error::Forbidden { required: Role::Dentist })
    ));
    assert!(matches!(
        ctx.ingest_service
            .ingest(Some(&doc), &submission("P-001"), Some(ImageUpload::new(vec![1])))
            .await,
        Err(Error::Forbidden { required: Role::Technician })
    ));
    assert!(matches!(
        ctx.report_service.generate_report(Some(&tech), "1").await,
        Err(Error::Forbidden { .. })
    ));
    assert!(matches!(
        ctx.scan_service.list_scans(None).await,
        Err(Error::Unauthenticated(CredentialRejection::Missing))
    ));
}

// ============================================================================
// Report Tests
// ============================================================================

#[tokio::test]
async fn test_report_for_fresh_scan_contains_fields_and_image() {
    let ctx = create_context(Arc::new(InMemoryImageStore::new()), test_config()).await;
    let tech = login(&ctx, "tech@example.com", "secret1").await;
    let doc = login(&ctx, "doc@example.com", "secret2").await;

    let record = ctx
        .ingest_service
        .ingest(
            Some(&tech),
            &submission("P-001"),
            Some(ImageUpload::new(png_bytes(30, 20)).with_content_type("image/png")),
        )
        .await
        .unwrap();

    let report = ctx
        .report_service
        .generate_report(Some(&doc), &record.id.to_string())
        .await
        .unwrap();
    assert_eq!(report.content_type, "application/pdf");
    assert_eq!(report.filename, "report_P-001.pdf");
    assert!(report.bytes.starts_with(b"%PDF"));
    assert!(contains(&report.bytes, "Jane Doe"));
    assert!(contains(&report.bytes, "P-001"));
    assert!(contains(&report.bytes, "Intraoral Scan"));
    assert!(contains(&report.bytes, "/Image"));

    // Same textual content on a second run
    let again = ctx
        .report_service
        .generate_report(Some(&doc), &record.id.to_string())
        .await
        .unwrap();
    assert!(contains(&again.bytes, "Jane Doe"));
    assert!(contains(&again.bytes, "P-001"));
}

#[tokio::test]
async fn test_report_for_unknown_scan_is_not_found() {
    let ctx = create_context(Arc::new(InMemoryImageStore::new()), test_config()).await;
    let doc = login(&ctx, "doc@example.com", "secret2").await;

    for id in ["1", "999999", "-5", "not-a-number"] {
        let result = ctx.report_service.generate_report(Some(&doc), id).await;
        assert!(matches!(result, Err(Error::NotFound(_))), "id {}", id);
    }
}

#[tokio::test]
async fn test_non_image_upload_is_rejected_and_not_recorded() {
    let memory = Arc::new(InMemoryImageStore::new());
    let ctx = create_context(memory.clone(), test_config()).await;
    let tech = login(&ctx, "tech@example.com", "secret1").await;

    let text = ImageUpload::new(b"hello, not an image".to_vec()).with_content_type("text/plain");
    let result = ctx
        .ingest_service
        .ingest(Some(&tech), &submission("P-404"), Some(text))
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(ctx.repository.count_scans().await.unwrap(), 0);
    assert!(memory.is_empty());
}

#[tokio::test]
async fn test_report_fails_when_stored_image_is_gone() {
    let memory = Arc::new(InMemoryImageStore::new());
    let ctx = create_context(memory.clone(), test_config()).await;
    let tech = login(&ctx, "tech@example.com", "secret1").await;
    let doc = login(&ctx, "doc@example.com", "secret2").await;

    let record = ctx
        .ingest_service
        .ingest(Some(&tech), &submission("P-410"), Some(ImageUpload::new(png_bytes(8, 8))))
        .await
        .unwrap();
    assert!(memory.remove(&record.image_locator));

    let result = ctx
        .report_service
        .generate_report(Some(&doc), &record.id.to_string())
        .await;
    assert!(matches!(result, Err(Error::ImageUnavailable(_))));
}
