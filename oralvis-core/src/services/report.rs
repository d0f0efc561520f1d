//! Report generation: scan metadata + image rendered into one document

use std::sync::Arc;

use crate::domain::report::report_filename;
use crate::domain::result::{Error, Result};
use crate::domain::{Report, ReportFields, Role};
use crate::ports::{DocumentRenderer, ImageStore, ScanRepository};
use crate::services::{timeouts, Authorizer, Timeouts};

pub struct ReportService {
    authorizer: Arc<Authorizer>,
    scans: Arc<dyn ScanRepository>,
    images: Arc<dyn ImageStore>,
    renderer: Arc<dyn DocumentRenderer>,
    timeouts: Timeouts,
}

impl ReportService {
    pub fn new(
        authorizer: Arc<Authorizer>,
        scans: Arc<dyn ScanRepository>,
        images: Arc<dyn ImageStore>,
        renderer: Arc<dyn DocumentRenderer>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            authorizer,
            scans,
            images,
            renderer,
            timeouts,
        }
    }

    /// Render the report for `scan_id`.
    ///
    /// The role check runs first, so callers without the Dentist role never
    /// learn whether an id exists. Ids that are not integers are simply unknown.
    pub async fn generate_report(&self, credential: Option<&str>, scan_id: &str) -> Result<Report> {
        self.authorizer.authorize(credential, Role::Dentist)?;

        let id: i64 = scan_id
            .trim()
            .parse()
            .map_err(|_| Error::not_found(format!("scan {}", scan_id)))?;
        let scan = timeouts::storage(self.timeouts.storage, self.scans.get_scan(id))
            .await?
            .ok_or_else(|| Error::not_found(format!("scan {}", id)))?;

        let image = timeouts::bounded(
            self.timeouts.image_store,
            self.images.fetch(&scan.image_locator),
            || Error::image_unavailable("image store timed out"),
        )
        .await
        .map_err(|e| match e {
            err @ Error::ImageUnavailable(_) => err,
            other => Error::image_unavailable(other.to_string()),
        })?;

        let fields = ReportFields::for_scan(&scan);
        let renderer = Arc::clone(&self.renderer);
        let bytes = tokio::task::spawn_blocking(move || renderer.render(&fields, &image))
            .await
            .map_err(|e| Error::Render(format!("render task failed: {}", e)))??;

        tracing::info!(scan_id = id, bytes = bytes.len(), "report generated");
        Ok(Report {
            filename: report_filename(&scan.patient_id),
            content_type: self.renderer.content_type(),
            bytes,
        })
    }
}
