//! Remove images that fail to decode.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{ensure_dir, is_image_file, DatasetError};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub valid: usize,
    /// Corrupt files that were deleted
    pub removed: Vec<PathBuf>,
}

/// Walk `dir` recursively, decode every `.jpg`/`.png`, delete the ones that fail.
pub fn validate_dir(dir: &Path) -> Result<ValidationReport, DatasetError> {
    ensure_dir(dir)?;
    tracing::info!("Validating images in {}", dir.display());

    let mut report = ValidationReport::default();
    let mut corrupt = Vec::new();
    visit(dir, &mut report, &mut corrupt)?;

    for path in corrupt {
        fs::remove_file(&path)?;
        tracing::warn!("Removed corrupt image: {}", path.display());
        report.removed.push(path);
    }

    tracing::info!("✅ Valid images: {}, removed: {}", report.valid, report.removed.len());
    Ok(report)
}

fn visit(dir: &Path, report: &mut ValidationReport, corrupt: &mut Vec<PathBuf>) -> Result<(), DatasetError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            visit(&path, report, corrupt)?;
        } else if is_image_file(&path) {
            match image::open(&path) {
                Ok(_) => report.valid += 1,
                Err(e) => {
                    tracing::debug!("Corrupt file {}: {}", path.display(), e);
                    corrupt.push(path);
                }
            }
        }
    }
    Ok(())
}
