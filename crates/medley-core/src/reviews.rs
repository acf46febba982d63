use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::ItemId;
use crate::store::StoreError;

/// A critic review attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemReview {
    pub reviewer_name: Option<String>,
    pub publisher: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub score: Option<f32>,
    pub likes: Option<bool>,
    pub url: Option<String>,
    pub caption: Option<String>,
}

/// File-backed review storage: one JSON document per item id.
///
/// A missing file or directory reads as an empty list, never an error.
pub struct CriticReviewStore {
    path: PathBuf,
}

impl CriticReviewStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn review_path(&self, id: ItemId) -> PathBuf {
        self.path.join(format!("{}.json", id))
    }

    pub fn get_reviews(&self, id: ItemId) -> Result<Vec<ItemReview>, StoreError> {
        match fs::read(self.review_path(id)) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Codec(format!("parse reviews: {}", e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::Storage(format!("read reviews: {}", e))),
        }
    }

    pub fn save_reviews(&self, id: ItemId, reviews: &[ItemReview]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.path)
            .map_err(|e| StoreError::Storage(format!("create reviews dir: {}", e)))?;
        let bytes = serde_json::to_vec(reviews)
            .map_err(|e| StoreError::Codec(format!("encode reviews: {}", e)))?;
        fs::write(self.review_path(id), bytes)
            .map_err(|e| StoreError::Storage(format!("write reviews: {}", e)))
    }

    pub fn data_path(&self) -> &Path {
        &self.path
    }
}
