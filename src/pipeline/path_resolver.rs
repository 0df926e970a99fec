//! # Path Resolution Module
//!
//! Centralizza la logica di calcolo dei path di output e la classificazione
//! base/variante dei sorgenti, condivisa tra Conversion Engine, Rename Stage
//! e orchestratore.

use crate::error::ConvertError;
use crate::file_manager::SourceFile;
use crate::image_processor::WEBP_EXTENSION;
use crate::naming::{self, DirectoryNaming};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Whether a source is a 2x variant (and therefore kept out of the manifest)
    pub fn is_variant(source: &SourceFile, honor_variants: bool) -> bool {
        honor_variants && naming::has_source_marker(&source.stem)
    }

    /// Output directory of a source: output root + transformed relative directory
    pub fn destination_dir(
        source: &SourceFile,
        output_root: &Path,
        directory_naming: DirectoryNaming,
    ) -> Result<PathBuf, ConvertError> {
        let relative = naming::transform_directory(&source.relative_dir, directory_naming)?;
        Ok(output_root.join(relative))
    }

    /// Canonical output path of a source before the 2x rename: `<destination>/<stem>.webp`
    pub fn output_path(
        source: &SourceFile,
        output_root: &Path,
        directory_naming: DirectoryNaming,
    ) -> Result<PathBuf, ConvertError> {
        let dir = Self::destination_dir(source, output_root, directory_naming)?;
        let result = dir.join(format!("{}.{}", source.stem, WEBP_EXTENSION));
        debug!("Resolved output path: {} -> {}", source.path.display(), result.display());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(path: &str) -> SourceFile {
        SourceFile::from_path(Path::new("/in"), Path::new(path)).unwrap()
    }

    #[test]
    fn test_top_level_base() {
        let path = PathResolver::output_path(&source("/in/a.png"), Path::new("/out"), DirectoryNaming::Identity).unwrap();
        assert_eq!(path, PathBuf::from("/out/a.webp"));
    }

    #[test]
    fn test_nested_variant_keeps_marker_until_rename() {
        let path = PathResolver::output_path(
            &source("/in/Summer Trip/hero@2x.jpg"),
            Path::new("/out"),
            DirectoryNaming::KebabCase,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/out/summer-trip/hero@2x.webp"));
    }

    #[test]
    fn test_variant_naming_disabled() {
        assert!(!PathResolver::is_variant(&source("/in/hero@2x.jpg"), false));
    }

    #[test]
    fn test_variant_classification_uses_source_marker() {
        assert!(PathResolver::is_variant(&source("/in/a@2x.png"), true));
        assert!(PathResolver::is_variant(&source("/in/hero@2x-dark.png"), true));
        assert!(!PathResolver::is_variant(&source("/in/a_2x.png"), true));
        assert!(!PathResolver::is_variant(&source("/in/a.png"), true));
    }
}
