//! Report document model

use super::ScanRecord;

/// Title printed at the top of every scan report
pub const REPORT_TITLE: &str = "OralVis Healthcare - Patient Report";

/// Textual content of a report, in print order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFields {
    pub title: String,
    /// (label, value) pairs
    pub lines: Vec<(String, String)>,
}

impl ReportFields {
    pub fn for_scan(scan: &ScanRecord) -> Self {
        let upload_date = scan.uploaded_at.format("%B %-d, %Y %H:%M:%S UTC").to_string();
        Self {
            title: REPORT_TITLE.to_string(),
            lines: vec![
                ("Patient Name".to_string(), scan.patient_name.clone()),
                ("Patient ID".to_string(), scan.patient_id.clone()),
                ("Scan Type".to_string(), scan.scan_type.to_string()),
                ("Region".to_string(), scan.region.to_string()),
                ("Upload Date".to_string(), upload_date),
            ],
        }
    }
}

/// A rendered report ready for download
#[derive(Debug, Clone)]
pub struct Report {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `report_<patientId>.pdf` with anything outside `[A-Za-z0-9._-]` replaced
pub fn report_filename(patient_id: &str) -> String {
    let safe: String = patient_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("report_{}.pdf", safe)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::domain::{ImageLocator, Region, ScanType};

    #[test]
    fn test_fields_in_print_order() {
        let scan = ScanRecord {
            id: 1,
            patient_name: "Jane Doe".into(),
            patient_id: "P-001".into(),
            scan_type: ScanType::Intraoral,
            region: Region::FullMouth,
            image_locator: ImageLocator::new("mem://1"),
            uploaded_at: Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 0).unwrap(),
        };
        let fields = ReportFields::for_scan(&scan);
        assert_eq!(fields.title, REPORT_TITLE);
        let labels: Vec<&str> = fields.lines.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            ["Patient Name", "Patient ID", "Scan Type", "Region", "Upload Date"]
        );
        assert_eq!(fields.lines[4].1, "March 9, 2025 14:05:00 UTC");
    }

    #[test]
    fn test_report_filename_is_header_safe() {
        assert_eq!(report_filename("P-001"), "report_P-001.pdf");
        assert_eq!(report_filename("a\"b/c d"), "report_a_b_c_d.pdf");
    }
}
