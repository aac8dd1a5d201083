//! Move loose images into label subdirectories.

use std::fs;
use std::path::Path;

use super::{bin_for, ensure_dir, is_image_file, Bin, BinStats, DatasetError};
use crate::logic::storage::record::parse_percentage;

/// Bin every top-level `.jpg`/`.png` in `dir` by its filename percentage.
/// Files already inside the label subdirectories are left alone.
pub fn organize_dir(dir: &Path, threshold: i64) -> Result<BinStats, DatasetError> {
    ensure_dir(dir)?;
    tracing::info!("Organizing dataset in {} (threshold: {}%)", dir.display(), threshold);

    for bin in Bin::ALL {
        fs::create_dir_all(dir.join(bin.dir_name()))?;
    }

    let mut stats = BinStats::default();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_image_file(&path) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let bin = bin_for(parse_percentage(name), threshold);
        let target = dir.join(bin.dir_name()).join(name);
        fs::rename(&path, &target)?;

        tracing::debug!("{} -> {}", name, bin.dir_name());
        stats.record(bin);
    }

    tracing::info!(
        "Organized {} images (normal: {}, cancer: {}, uncertain: {})",
        stats.total(),
        stats.normal,
        stats.cancer,
        stats.uncertain
    );

    Ok(stats)
}
