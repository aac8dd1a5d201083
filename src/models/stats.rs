//! Stats model

use serde::{Deserialize, Serialize};

use crate::logic::storage::{FolderId, Tally};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub total_images: usize,
    pub cancer_predictions: usize,
    pub normal_predictions: usize,
    pub folder_id: FolderId,
}

impl StatsResponse {
    pub fn new(tally: Tally, folder_id: FolderId) -> Self {
        Self {
            success: true,
            total_images: tally.total,
            cancer_predictions: tally.cancer,
            normal_predictions: tally.normal,
            folder_id,
        }
    }
}
