//! # Manifest Module
//!
//! Serializza le dimensioni delle immagini base in un unico file JSON alla
//! root di output.
//!
//! ## Formato:
//! ```json
//! [
//!   {
//!     "src": "a",
//!     "width": 100,
//!     "height": 50
//!   }
//! ]
//! ```
//!
//! Il file viene scritto una sola volta per run, in modo atomico: prima un
//! file temporaneo nella stessa directory, poi il rename sul nome finale.

use crate::error::ConvertError;
use crate::metadata::ImageInfo;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Ordered list of base-asset dimensions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<ImageInfo>,
}

impl Manifest {
    pub fn from_entries(entries: Vec<ImageInfo>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ImageInfo] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty-printed JSON document
    pub fn to_json(&self) -> Result<String, ConvertError> {
        serde_json::to_string_pretty(self).map_err(|e| ConvertError::Manifest(e.to_string()))
    }

    /// Write the manifest to `output_root/file_name`, creating the root if needed
    pub async fn write(&self, output_root: &Path, file_name: &str) -> Result<PathBuf, ConvertError> {
        let json = self.to_json()?;
        let target = output_root.join(file_name);
        let root = output_root.to_path_buf();
        let destination = target.clone();

        tokio::task::spawn_blocking(move || -> Result<(), ConvertError> {
            std::fs::create_dir_all(&root)?;
            let mut temp = tempfile::NamedTempFile::new_in(&root)?;
            temp.write_all(json.as_bytes())?;
            temp.write_all(b"\n")?;
            temp.as_file().sync_all()?;
            temp.persist(&destination)
                .map_err(|e| ConvertError::Manifest(format!("cannot write {}: {}", destination.display(), e)))?;
            Ok(())
        })
        .await
        .map_err(|e| ConvertError::Manifest(format!("manifest task failed: {}", e)))??;

        info!("Manifest with {} entries written to {}", self.len(), target.display());
        Ok(target)
    }

    /// Read a manifest back from disk
    pub async fn load(path: &Path) -> Result<Self, ConvertError> {
        let content = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(|e| ConvertError::Manifest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn info(src: &str, width: u32, height: u32) -> ImageInfo {
        ImageInfo {
            src: src.to_string(),
            width,
            height,
        }
    }

    #[test]
    fn test_pretty_json_layout() {
        let manifest = Manifest::from_entries(vec![info("a", 100, 50)]);
        let expected = "[\n  {\n    \"src\": \"a\",\n    \"width\": 100,\n    \"height\": 50\n  }\n]";
        assert_eq!(manifest.to_json().unwrap(), expected);
    }

    #[test]
    fn test_empty_manifest_is_empty_array() {
        assert_eq!(Manifest::default().to_json().unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_write_creates_root_and_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("not/yet/there");
        let manifest = Manifest::from_entries(vec![info("a", 1, 2), info("b", 3, 4)]);

        let path = manifest.write(&root, "info.json").await.unwrap();
        assert_eq!(path, root.join("info.json"));
        assert_eq!(Manifest::load(&path).await.unwrap(), manifest);

        // only the manifest is left behind, no temp files
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_manifest() {
        let temp_dir = TempDir::new().unwrap();
        Manifest::from_entries(vec![info("old", 1, 1)])
            .write(temp_dir.path(), "info.json")
            .await
            .unwrap();
        let path = Manifest::default().write(temp_dir.path(), "info.json").await.unwrap();

        assert!(Manifest::load(&path).await.unwrap().is_empty());
    }
}
