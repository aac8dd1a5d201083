//! Storage Module - Remote Training Data Store
//!
//! This module handles:
//! - Service account authentication
//! - Search-or-create of the upload folder
//! - Image uploads with prediction metadata
//! - Listing and tallying stored records

pub mod auth;
pub mod drive;
pub mod record;

#[cfg(test)]
pub(crate) mod fake_drive;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{Credentials, ServiceAccountKey, TokenProvider};
pub use drive::{DriveClient, DriveConfig};
pub use record::{PredictionSnapshot, UploadRecord};

/// Folder name used by the service and the dataset tool
pub const DEFAULT_FOLDER_NAME: &str = "OralCancerDetection_TrainingData";

// ============================================================================
// TYPES
// ============================================================================

/// Remote folder identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub String);

impl FolderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata attached to an uploaded file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub description: String,
    pub properties: BTreeMap<String, String>,
    pub mime_type: String,
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub file_id: String,
    pub file_name: String,
    pub web_link: Option<String>,
}

/// One stored file as reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    /// Drive reports int64 values as strings
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl StoredFile {
    /// `prediction_percentage` property, if present and numeric
    pub fn prediction_percentage(&self) -> Option<i64> {
        self.properties
            .get(record::PROP_PERCENTAGE)
            .and_then(|v| v.trim().parse().ok())
    }
}

/// Counts over a folder listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: usize,
    pub cancer: usize,
    pub normal: usize,
}

/// Records above 50% are counted as cancer, everything else as normal.
/// A missing or malformed percentage counts as 0.
pub fn tally(files: &[StoredFile]) -> Tally {
    files.iter().fold(Tally::default(), |mut acc, file| {
        acc.total += 1;
        if file.prediction_percentage().unwrap_or(0) > 50 {
            acc.cancer += 1;
        } else {
            acc.normal += 1;
        }
        acc
    })
}

// ============================================================================
// ERRORS
// ============================================================================

/// Storage errors. Transient and permanent failures are not distinguished.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    #[error("token exchange failed: {0}")]
    Token(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("storage API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("folder '{0}' not found")]
    FolderNotFound(String),
}

// ============================================================================
// GATEWAY
// ============================================================================

/// Remote file store used by the HTTP layer
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Find the folder by name, creating it when missing
    async fn ensure_folder(&self, name: &str) -> Result<FolderId, StorageError>;

    async fn upload(
        &self,
        folder: &FolderId,
        bytes: Vec<u8>,
        filename: &str,
        metadata: &UploadMetadata,
    ) -> Result<UploadResult, StorageError>;

    /// All non-trashed files in the folder
    async fn list(&self, folder: &FolderId) -> Result<Vec<StoredFile>, StorageError>;
}
