//! Document renderer port

use crate::domain::result::Result;
use crate::domain::ReportFields;

/// Renders report fields and an image into a printable document.
///
/// Rendering is CPU-bound; callers run it off the async executor.
pub trait DocumentRenderer: Send + Sync {
    /// MIME type of produced documents
    fn content_type(&self) -> &'static str;

    /// Undecodable image bytes must fail with `ImageUnavailable`, never
    /// produce a document without the image.
    fn render(&self, fields: &ReportFields, image: &[u8]) -> Result<Vec<u8>>;
}
