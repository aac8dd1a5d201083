//! `manifest.json`: one entry per remote image, written before download.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::DatasetError;
use crate::logic::storage::record::parse_percentage;
use crate::logic::storage::StoredFile;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub file_id: String,
    pub created_time: Option<String>,
    pub size_bytes: Option<String>,
    pub description: String,
    pub prediction_percentage: Option<i64>,
    /// "cancer" (> 50), "normal", or "unknown" when the name has no percentage
    pub classification: String,
}

impl From<&StoredFile> for ManifestEntry {
    fn from(file: &StoredFile) -> Self {
        let percentage = parse_percentage(&file.name);
        let classification = match percentage {
            Some(p) if p > 50 => "cancer",
            Some(_) => "normal",
            None => "unknown",
        };

        Self {
            filename: file.name.clone(),
            file_id: file.id.clone(),
            created_time: file.created_time.clone(),
            size_bytes: file.size.clone(),
            description: file.description.clone().unwrap_or_default(),
            prediction_percentage: percentage,
            classification: classification.to_string(),
        }
    }
}

pub fn build_manifest(files: &[StoredFile]) -> Vec<ManifestEntry> {
    files.iter().map(ManifestEntry::from).collect()
}

pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<(), DatasetError> {
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(path, json)?;
    tracing::info!("✅ Manifest created: {} ({} entries)", path.display(), entries.len());
    Ok(())
}
