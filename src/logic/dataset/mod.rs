//! Dataset Module - Training Set Preparation
//!
//! Pulls stored uploads back out of remote storage and lays them out for
//! retraining:
//! - `download`: fetch every image plus a `manifest.json`
//! - `organize`: bin files into `normal/`, `cancer/`, `uncertain/`
//! - `validate`: drop files that no longer decode
//!
//! Labels come from the percentage encoded in the filename
//! (see `storage::record::parse_percentage`).

pub mod download;
pub mod manifest;
pub mod organize;
pub mod validate;


use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::logic::storage::StorageError;

pub use download::{download_all, DownloadReport};
pub use manifest::{build_manifest, write_manifest, ManifestEntry, MANIFEST_FILE};
pub use organize::organize_dir;
pub use validate::{validate_dir, ValidationReport};

/// Default binning threshold (percent)
pub const DEFAULT_THRESHOLD: i64 = 50;

/// Width of the uncertain band on each side of the threshold
pub const UNCERTAIN_MARGIN: i64 = 20;

// ============================================================================
// BINS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bin {
    Normal,
    Cancer,
    Uncertain,
}

impl Bin {
    pub const ALL: [Bin; 3] = [Bin::Normal, Bin::Cancer, Bin::Uncertain];

    /// Subdirectory name
    pub fn dir_name(&self) -> &'static str {
        match self {
            Bin::Normal => "normal",
            Bin::Cancer => "cancer",
            Bin::Uncertain => "uncertain",
        }
    }
}

/// percent > T+20 -> cancer, percent < T-20 -> normal, else uncertain.
/// Unparseable filenames land in uncertain.
pub fn bin_for(percentage: Option<i64>, threshold: i64) -> Bin {
    match percentage {
        Some(p) if p > threshold.saturating_add(UNCERTAIN_MARGIN) => Bin::Cancer,
        Some(p) if p < threshold.saturating_sub(UNCERTAIN_MARGIN) => Bin::Normal,
        _ => Bin::Uncertain,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BinStats {
    pub normal: usize,
    pub cancer: usize,
    pub uncertain: usize,
}

impl BinStats {
    pub fn record(&mut self, bin: Bin) {
        match bin {
            Bin::Normal => self.normal += 1,
            Bin::Cancer => self.cancer += 1,
            Bin::Uncertain => self.uncertain += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.normal + self.cancer + self.uncertain
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// `.jpg` / `.png` by extension (case-sensitive, as uploads are named)
pub fn is_image_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jpg") | Some("png")
    )
}

fn ensure_dir(dir: &Path) -> Result<(), DatasetError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(DatasetError::NotADirectory(dir.to_path_buf()))
    }
}
