//! Ingestion pipeline: authorize, validate, store image, then persist metadata

use std::sync::Arc;

use image::ImageFormat;

use crate::domain::result::{Error, Result};
use crate::domain::{upload_timestamp_now, ImageUpload, NewScan, Role, ScanRecord, ScanSubmission};
use crate::ports::{ImageStore, ScanRepository};
use crate::services::{timeouts, Authorizer, Timeouts};

/// Default namespace hint handed to the image store
pub const DEFAULT_IMAGE_FOLDER: &str = "oralvis";

pub struct IngestService {
    authorizer: Arc<Authorizer>,
    images: Arc<dyn ImageStore>,
    scans: Arc<dyn ScanRepository>,
    folder: String,
    timeouts: Timeouts,
}

impl IngestService {
    pub fn new(
        authorizer: Arc<Authorizer>,
        images: Arc<dyn ImageStore>,
        scans: Arc<dyn ScanRepository>,
        folder: impl Into<String>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            authorizer,
            images,
            scans,
            folder: folder.into(),
            timeouts,
        }
    }

    /// Ingest one scan.
    ///
    /// The metadata row is written only after the image store has returned a
    /// locator, so a failed hand-off never leaves a record behind.
    ///
    /// A `Storage` timeout on the insert abandons the wait, not the write: the
    /// row may still commit on the blocking pool. Callers that retry after a
    /// `storage_error` can therefore create a second record for the same scan.
    pub async fn ingest(
        &self,
        credential: Option<&str>,
        submission: &ScanSubmission,
        image: Option<ImageUpload>,
    ) -> Result<ScanRecord> {
        let principal = self.authorizer.authorize(credential, Role::Technician)?;

        let metadata = submission.validate()?;
        let image = image
            .filter(|img| !img.bytes.is_empty())
            .ok_or_else(|| Error::validation("missing required field: scanImage"))
            .and_then(sniff_image)?;

        let locator = timeouts::bounded(
            self.timeouts.image_store,
            self.images.put(&image, &self.folder),
            || Error::upload_failed("image store timed out"),
        )
        .await
        .map_err(|e| match e {
            err @ Error::UploadFailed(_) => err,
            other => Error::upload_failed(other.to_string()),
        })?;
        tracing::debug!(store = self.images.name(), bytes = image.bytes.len(), "image stored");

        let record = timeouts::storage(
            self.timeouts.storage,
            self.scans.insert_scan(NewScan {
                metadata,
                image_locator: locator,
                uploaded_at: upload_timestamp_now(),
            }),
        )
        .await?;

        tracing::info!(scan_id = record.id, by = %principal.role, "scan ingested");
        Ok(record)
    }
}

/// Accept only the formats the report renderer can decode.
///
/// The declared content type is replaced by the detected one, which also
/// picks the stored object's extension.
fn sniff_image(mut upload: ImageUpload) -> Result<ImageUpload> {
    let mime = match image::guess_format(&upload.bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        _ => return Err(Error::validation("scanImage must be a JPEG or PNG image")),
    };
    upload.content_type = Some(mime.to_string());
    Ok(upload)
}
