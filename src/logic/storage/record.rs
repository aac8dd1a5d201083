//! Upload Record
//!
//! Filename convention, description text and properties for stored images.
//! Filenames look like `oral_cancer_20240215_103000_75pct.jpg` and are parsed
//! back by the dataset tool.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use validator::Validate;

use super::UploadMetadata;
use crate::logic::classifier::Diagnosis;

pub const FILENAME_PREFIX: &str = "oral_cancer";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub const APP_NAME: &str = "OralCancerDetection";
pub const RECORD_VERSION: &str = "2.0";

pub const PROP_PERCENTAGE: &str = "prediction_percentage";

const UNKNOWN: &str = "Unknown";

static PERCENT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)pct\.(?:jpg|png)$").expect("valid regex"));

// ============================================================================
// PREDICTION SNAPSHOT
// ============================================================================

/// Prediction as reported alongside an uploaded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PredictionSnapshot {
    /// Cancer likelihood in [0, 1]
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub probability: f64,

    #[serde(default = "unknown")]
    pub classification: String,

    /// Fraction in [0, 1]
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,

    #[serde(default = "unknown")]
    pub severity: String,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

impl Default for PredictionSnapshot {
    fn default() -> Self {
        Self {
            probability: 0.0,
            classification: unknown(),
            confidence: 0.0,
            severity: unknown(),
        }
    }
}

impl From<&Diagnosis> for PredictionSnapshot {
    fn from(diagnosis: &Diagnosis) -> Self {
        Self {
            probability: diagnosis.probability().complement(),
            classification: diagnosis.label().to_string(),
            confidence: diagnosis.confidence() / 100.0,
            severity: diagnosis.risk_level().as_str().to_string(),
        }
    }
}

impl PredictionSnapshot {
    pub fn percentage(&self) -> i64 {
        (self.probability * 100.0).round() as i64
    }
}

// ============================================================================
// UPLOAD RECORD
// ============================================================================

#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub filename: String,
    pub created_at: DateTime<Local>,
    pub snapshot: PredictionSnapshot,
    pub bytes: Vec<u8>,
}

impl UploadRecord {
    pub fn new(bytes: Vec<u8>, snapshot: PredictionSnapshot, created_at: DateTime<Local>) -> Self {
        let filename = build_filename(&created_at, snapshot.percentage());
        Self {
            filename,
            created_at,
            snapshot,
            bytes,
        }
    }

    pub fn percentage(&self) -> i64 {
        self.snapshot.percentage()
    }

    pub fn checksum(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }

    pub fn description(&self) -> String {
        format!(
            "Oral Cancer Detection Upload\n\
             Timestamp: {}\n\
             Prediction: {}%\n\
             Classification: {}\n\
             Confidence: {:.1}%\n\
             Severity: {}",
            self.created_at.to_rfc3339(),
            self.percentage(),
            self.snapshot.classification,
            self.snapshot.confidence * 100.0,
            self.snapshot.severity,
        )
    }

    pub fn properties(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();
        props.insert("app".to_string(), APP_NAME.to_string());
        props.insert("version".to_string(), RECORD_VERSION.to_string());
        props.insert("timestamp".to_string(), self.created_at.format(TIMESTAMP_FORMAT).to_string());
        props.insert(PROP_PERCENTAGE.to_string(), self.percentage().to_string());
        props.insert("classification".to_string(), self.snapshot.classification.clone());
        props.insert("severity".to_string(), self.snapshot.severity.clone());
        props.insert("sha256".to_string(), self.checksum());
        props
    }

    pub fn metadata(&self) -> UploadMetadata {
        UploadMetadata {
            description: self.description(),
            properties: self.properties(),
            mime_type: "image/jpeg".to_string(),
        }
    }
}

// ============================================================================
// FILENAMES
// ============================================================================

pub fn build_filename(created_at: &DateTime<Local>, percentage: i64) -> String {
    format!(
        "{}_{}_{}pct.jpg",
        FILENAME_PREFIX,
        created_at.format(TIMESTAMP_FORMAT),
        percentage
    )
}

/// Percentage encoded in a stored filename.
///
/// Needs at least four `_`-separated parts and a `<n>pct.jpg` / `<n>pct.png`
/// tail; anything else is unparseable.
pub fn parse_percentage(filename: &str) -> Option<i64> {
    let parts: Vec<&str> = filename.split('_').collect();
    if parts.len() < 4 {
        return None;
    }

    let tail = parts.last()?;
    let caps = PERCENT_SUFFIX.captures(tail)?;
    caps.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_filename_convention() {
        let name = build_filename(&at(2024, 2, 15, 10, 30, 0), 75);
        assert_eq!(name, "oral_cancer_20240215_103000_75pct.jpg");
    }

    #[test]
    fn test_parse_percentage() {
        assert_eq!(parse_percentage("oral_cancer_20240215_103000_75pct.jpg"), Some(75));
        assert_eq!(parse_percentage("oral_cancer_20240215_103000_0pct.png"), Some(0));
        assert_eq!(parse_percentage("oral_cancer_2024-02-15T10-30-00_75pct.jpg"), Some(75));
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(parse_percentage("oral_cancer_20240215_103000_75.jpg"), None);
        assert_eq!(parse_percentage("oral_cancer_20240215_103000_75pct.jpeg"), None);
        assert_eq!(parse_percentage("oral_cancer_75pct.jpg"), None);
        assert_eq!(parse_percentage("oral_cancer_20240215_103000_xxpct.jpg"), None);
        assert_eq!(parse_percentage("IMG_0001.jpg"), None);
    }

    #[test]
    fn test_round_trip_through_filename() {
        let snapshot = PredictionSnapshot {
            probability: 0.29,
            ..Default::default()
        };
        let record = UploadRecord::new(vec![1, 2, 3], snapshot, at(2024, 1, 1, 8, 0, 0));

        assert_eq!(record.percentage(), 29);
        assert_eq!(parse_percentage(&record.filename), Some(29));
    }

    #[test]
    fn test_metadata_contents() {
        let snapshot = PredictionSnapshot {
            probability: 0.85,
            classification: "Cancer Detected".to_string(),
            confidence: 0.85,
            severity: "High".to_string(),
        };
        let record = UploadRecord::new(b"jpeg".to_vec(), snapshot, at(2024, 2, 15, 10, 30, 0));
        let meta = record.metadata();

        assert_eq!(meta.mime_type, "image/jpeg");
        assert_eq!(meta.properties["app"], "OralCancerDetection");
        assert_eq!(meta.properties["version"], "2.0");
        assert_eq!(meta.properties["timestamp"], "20240215_103000");
        assert_eq!(meta.properties["prediction_percentage"], "85");
        assert_eq!(meta.properties["classification"], "Cancer Detected");
        assert_eq!(meta.properties["severity"], "High");
        assert_eq!(meta.properties["sha256"].len(), 64);

        assert!(meta.description.starts_with("Oral Cancer Detection Upload"));
        assert!(meta.description.contains("Prediction: 85%"));
        assert!(meta.description.contains("Confidence: 85.0%"));
    }

    #[test]
    fn test_snapshot_defaults() {
        let snapshot: PredictionSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, PredictionSnapshot::default());
        assert_eq!(snapshot.classification, "Unknown");
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_snapshot_validation() {
        let snapshot = PredictionSnapshot {
            probability: 1.2,
            ..Default::default()
        };
        assert!(snapshot.validate().is_err());
    }
}
