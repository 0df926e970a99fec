//! # Metadata Extraction Module
//!
//! Legge le dimensioni intrinseche (in pixel) di un'immagine per il manifest.
//! Solo l'header viene decodificato, tramite il crate `image`, sul thread pool
//! bloccante di tokio. Il lettore è dietro il trait [`DimensionReader`].

use crate::error::ConvertError;
use crate::file_manager::SourceFile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Dimensions of one base asset, as listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// File stem, without extension
    pub src: String,
    pub width: u32,
    pub height: u32,
}

/// Something able to read the pixel dimensions of an image file.
///
/// Called on the blocking pool.
pub trait DimensionReader: Send + Sync {
    fn read_dimensions(&self, path: &Path) -> Result<(u32, u32), ConvertError>;
}

/// Header-only reader backed by the `image` crate
pub struct ImageHeaderReader;

impl DimensionReader for ImageHeaderReader {
    /// Read dimensions, guessing the format from content first
    fn read_dimensions(&self, path: &Path) -> Result<(u32, u32), ConvertError> {
        let unreadable = |reason: String| ConvertError::UnreadableImage {
            path: PathBuf::from(path),
            reason,
        };

        image::io::Reader::open(path)
            .map_err(|e| unreadable(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| unreadable(e.to_string()))?
            .into_dimensions()
            .map_err(|e| unreadable(e.to_string()))
    }
}

/// Builds manifest entries from source images
#[derive(Clone)]
pub struct MetadataExtractor {
    reader: Arc<dyn DimensionReader>,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(Arc::new(ImageHeaderReader))
    }
}

impl MetadataExtractor {
    pub fn new(reader: Arc<dyn DimensionReader>) -> Self {
        Self { reader }
    }

    /// Extract the manifest entry for a source image.
    ///
    /// Fails with `UnreadableImage` when the file cannot be parsed as an image.
    pub async fn extract(&self, source: &SourceFile) -> Result<ImageInfo, ConvertError> {
        let path = source.path.clone();
        let reader = self.reader.clone();
        let (width, height) = tokio::task::spawn_blocking(move || reader.read_dimensions(&path))
            .await
            .map_err(|e| ConvertError::UnreadableImage {
                path: source.path.clone(),
                reason: format!("extraction task failed: {}", e),
            })??;

        debug!("Read {}x{} from {}", width, height, source.path.display());
        Ok(ImageInfo {
            src: source.stem.clone(),
            width,
            height,
        })
    }
}
