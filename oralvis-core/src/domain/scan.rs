//! Scan domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Imaging modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanType {
    #[serde(rename = "Intraoral Scan")]
    Intraoral,
    #[serde(rename = "CBCT Scan")]
    Cbct,
}

impl ScanType {
    pub const ALL: [ScanType; 2] = [ScanType::Intraoral, ScanType::Cbct];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Intraoral => "Intraoral Scan",
            ScanType::Cbct => "CBCT Scan",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::validation(format!("unknown scan type: {}", s)))
    }
}

/// Anatomical region covered by a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "Full Mouth")]
    FullMouth,
    #[serde(rename = "Upper Arch")]
    UpperArch,
    #[serde(rename = "Lower Arch")]
    LowerArch,
    #[serde(rename = "Specific Teeth")]
    SpecificTeeth,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::FullMouth,
        Region::UpperArch,
        Region::LowerArch,
        Region::SpecificTeeth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::FullMouth => "Full Mouth",
            Region::UpperArch => "Upper Arch",
            Region::LowerArch => "Lower Arch",
            Region::SpecificTeeth => "Specific Teeth",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::validation(format!("unknown region: {}", s)))
    }
}

/// Opaque reference returned by the image store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageLocator(String);

impl ImageLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw image payload handed from the client to the image store
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: None,
            filename: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Declared MIME type, else guessed from the filename
    pub fn mime_type(&self) -> String {
        if let Some(ct) = self.content_type.as_deref().filter(|ct| !ct.trim().is_empty()) {
            return ct.trim().to_string();
        }
        self.filename
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first_raw())
            .unwrap_or("application/octet-stream")
            .to_string()
    }

    /// File extension for the stored object
    pub fn extension(&self) -> &'static str {
        match self.mime_type().as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/bmp" => "bmp",
            "image/tiff" => "tiff",
            _ => "bin",
        }
    }
}

/// Unvalidated metadata as submitted with an upload
#[derive(Debug, Clone, Default)]
pub struct ScanSubmission {
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub scan_type: Option<String>,
    pub region: Option<String>,
}

impl ScanSubmission {
    /// Check every field is present and parse the enumerated ones
    pub fn validate(&self) -> Result<ScanMetadata> {
        let patient_name = required("patientName", &self.patient_name)?;
        let patient_id = required("patientId", &self.patient_id)?;
        let scan_type = required("scanType", &self.scan_type)?.parse()?;
        let region = required("region", &self.region)?.parse()?;

        Ok(ScanMetadata {
            patient_name,
            patient_id,
            scan_type,
            region,
        })
    }
}

fn required(field: &str, value: &Option<String>) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(Error::validation(format!("missing required field: {}", field))),
    }
}

/// Validated scan metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMetadata {
    pub patient_name: String,
    pub patient_id: String,
    pub scan_type: ScanType,
    pub region: Region,
}

/// A scan ready to be inserted; the repository assigns the identifier
#[derive(Debug, Clone)]
pub struct NewScan {
    pub metadata: ScanMetadata,
    pub image_locator: ImageLocator,
    pub uploaded_at: DateTime<Utc>,
}

/// Immutable persisted scan metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: i64,
    pub patient_name: String,
    pub patient_id: String,
    pub scan_type: ScanType,
    pub region: Region,
    #[serde(rename = "imageUrl")]
    pub image_locator: ImageLocator,
    #[serde(rename = "uploadDate")]
    pub uploaded_at: DateTime<Utc>,
}

impl ScanRecord {
    pub fn from_new(id: i64, scan: NewScan) -> Self {
        Self {
            id,
            patient_name: scan.metadata.patient_name,
            patient_id: scan.metadata.patient_id,
            scan_type: scan.metadata.scan_type,
            region: scan.metadata.region,
            image_locator: scan.image_locator,
            uploaded_at: scan.uploaded_at,
        }
    }
}

/// Current time truncated to the microsecond precision the repository keeps
pub fn upload_timestamp_now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> ScanSubmission {
        ScanSubmission {
            patient_name: Some("Jane Doe".into()),
            patient_id: Some("P-001".into()),
            scan_type: Some("Intraoral Scan".into()),
            region: Some("Full Mouth".into()),
        }
    }

    #[test]
    fn test_valid_submission() {
        let meta = submission().validate().unwrap();
        assert_eq!(meta.patient_name, "Jane Doe");
        assert_eq!(meta.scan_type, ScanType::Intraoral);
        assert_eq!(meta.region, Region::FullMouth);
    }

    #[test]
    fn test_missing_and_blank_fields_rejected() {
        let mut s = submission();
        s.patient_id = None;
        assert!(matches!(s.validate(), Err(Error::Validation(m)) if m.contains("patientId")));

        let mut s = submission();
        s.patient_name = Some("   ".into());
        assert!(matches!(s.validate(), Err(Error::Validation(m)) if m.contains("patientName")));
    }

    #[test]
    fn test_unknown_enumerations_rejected() {
        let mut s = submission();
        s.scan_type = Some("MRI".into());
        assert!(matches!(s.validate(), Err(Error::Validation(_))));

        let mut s = submission();
        s.region = Some("Left Ear".into());
        assert!(matches!(s.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_enum_parsing_ignores_case() {
        assert_eq!("cbct scan".parse::<ScanType>().unwrap(), ScanType::Cbct);
        assert_eq!("UPPER ARCH".parse::<Region>().unwrap(), Region::UpperArch);
    }

    #[test]
    fn test_record_json_shape() {
        let record = ScanRecord {
            id: 7,
            patient_name: "Jane Doe".into(),
            patient_id: "P-001".into(),
            scan_type: ScanType::Cbct,
            region: Region::LowerArch,
            image_locator: ImageLocator::new("https://img.example/x.png"),
            uploaded_at: upload_timestamp_now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["patientId"], "P-001");
        assert_eq!(json["scanType"], "CBCT Scan");
        assert_eq!(json["region"], "Lower Arch");
        assert_eq!(json["imageUrl"], "https://img.example/x.png");
        assert!(json["uploadDate"].is_string());
    }

    #[test]
    fn test_upload_extension_from_type_or_name() {
        assert_eq!(ImageUpload::new(vec![1]).with_content_type("image/png").extension(), "png");
        assert_eq!(ImageUpload::new(vec![1]).with_filename("scan.JPG").extension(), "jpg");
        assert_eq!(ImageUpload::new(vec![1]).extension(), "bin");
    }

    #[test]
    fn test_timestamp_truncated_to_micros() {
        let ts = upload_timestamp_now();
        assert_eq!(ts.timestamp_subsec_nanos() % 1_000, 0);
    }
}
