//! Fetch the stored training images into a local directory.

use std::fs;
use std::path::Path;

use serde::Serialize;

use super::manifest::{build_manifest, write_manifest, MANIFEST_FILE};
use super::validate::{validate_dir, ValidationReport};
use super::DatasetError;
use crate::logic::storage::{DriveClient, StorageError};

#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadReport {
    pub listed: usize,
    pub downloaded: usize,
    pub failed: Vec<String>,
    pub validation: ValidationReport,
}

/// Find `folder_name`, write the manifest, download every image and drop
/// the ones that do not decode. A failed file is logged and skipped.
pub async fn download_all(
    client: &DriveClient,
    folder_name: &str,
    output_dir: &Path,
) -> Result<DownloadReport, DatasetError> {
    fs::create_dir_all(output_dir)?;

    let folder = client
        .find_folder(folder_name)
        .await?
        .ok_or_else(|| StorageError::FolderNotFound(folder_name.to_string()))?;
    tracing::info!("✅ Found folder '{}' ({})", folder_name, folder);

    let files = client.list_images(&folder).await?;
    let mut report = DownloadReport {
        listed: files.len(),
        ..Default::default()
    };

    if files.is_empty() {
        tracing::warn!("No images found in '{}'", folder_name);
        return Ok(report);
    }

    write_manifest(&output_dir.join(MANIFEST_FILE), &build_manifest(&files))?;

    tracing::info!("Downloading {} images...", files.len());
    for (i, file) in files.iter().enumerate() {
        // Remote names are untrusted; keep only the final component
        let Some(name) = Path::new(&file.name).file_name() else {
            report.failed.push(file.name.clone());
            continue;
        };

        let bytes = match client.download(&file.id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to download {}: {}", file.name, e);
                report.failed.push(file.name.clone());
                continue;
            }
        };

        match fs::write(output_dir.join(name), bytes) {
            Ok(()) => {
                report.downloaded += 1;
                tracing::debug!("[{}/{}] {}", i + 1, files.len(), file.name);
            }
            Err(e) => {
                tracing::error!("Failed to save {}: {}", file.name, e);
                report.failed.push(file.name.clone());
            }
        }
    }

    tracing::info!("✅ Downloaded: {}/{} images", report.downloaded, report.listed);
    report.validation = validate_dir(output_dir)?;

    Ok(report)
}
