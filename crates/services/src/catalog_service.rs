use std::sync::Arc;

use prep_core::model::{PdfMaterial, VideoLesson};
use storage::repository::{CatalogRepository, StorageError};

/// Read side of the video and PDF catalog.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// Video lessons, optionally restricted to one discipline (exact match).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    pub async fn videos(&self, discipline: Option<&str>) -> Result<Vec<VideoLesson>, StorageError> {
        let mut videos = self.catalog.videos().await?;
        if let Some(d) = discipline.map(str::trim).filter(|d| !d.is_empty()) {
            videos.retain(|v| v.discipline == d);
        }
        Ok(videos)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    pub async fn materials(&self) -> Result<Vec<PdfMaterial>, StorageError> {
        self.catalog.materials().await
    }
}
