//! # File Management Module
//!
//! Questo modulo gestisce la discovery delle immagini sotto la root di input.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva delle immagini candidate (`walkdir`)
//! - Ordine stabile dei risultati tra un run e l'altro
//! - Costruzione dei `SourceFile` immutabili
//! - Utilità per la formattazione human-readable delle dimensioni
//!
//! ## Formati supportati:
//! - **Immagini**: JPG, JPEG, PNG, WebP, TIFF
//!
//! ## Regole di traversal:
//! - I symlink non vengono seguiti (niente cicli)
//! - File e directory nascosti (`.qualcosa`) esclusi salvo `include_hidden`
//! - Root mancante → `DirectoryNotFound`; root vuota → lista vuota
//! - Una directory di output annidata nella root viene saltata per intero
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::enumerate(Path::new("/path/to/input"), false, Some(Path::new("/path/to/input/out")))?;
//! for file in files {
//!     let source = SourceFile::from_path(&root, &file)?;
//! }
//! ```

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "tif", "tiff"];

/// An image found under the input root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    /// Absolute path of the image
    pub path: PathBuf,
    /// Directory relative to the input root (empty for top-level files)
    pub relative_dir: PathBuf,
    /// File name without extension
    pub stem: String,
    /// Extension as found on disk
    pub extension: String,
}

impl SourceFile {
    /// Build a source file from an enumerated path under `root`
    pub fn from_path(root: &Path, path: &Path) -> Result<Self, ConvertError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConvertError::InvalidName(path.display().to_string()))?
            .to_string();

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let relative_dir = path
            .parent()
            .and_then(|parent| parent.strip_prefix(root).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            relative_dir,
            stem,
            extension,
        })
    }

    /// File name as found on disk, for log messages
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }
}

/// Manages file discovery
pub struct FileManager;

impl FileManager {
    /// Find all candidate images under `root`, recursively, in a stable order.
    ///
    /// `exclude` is pruned from the walk when it lies strictly inside `root`,
    /// so outputs written under the input tree are not picked up again.
    pub fn enumerate(root: &Path, include_hidden: bool, exclude: Option<&Path>) -> Result<Vec<PathBuf>, ConvertError> {
        if !root.is_dir() {
            return Err(ConvertError::DirectoryNotFound(root.to_path_buf()));
        }

        let root = root
            .canonicalize()
            .map_err(|_| ConvertError::DirectoryNotFound(root.to_path_buf()))?;

        let excluded = exclude
            .and_then(|dir| dir.canonicalize().ok())
            .filter(|dir| dir != &root && dir.starts_with(&root));
        if let Some(dir) = &excluded {
            debug!("Not descending into output directory {}", dir.display());
        }

        let mut files = Vec::new();

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 {
                    return true;
                }
                if excluded.as_deref() == Some(e.path()) {
                    return false;
                }
                include_hidden || !Self::is_hidden(e)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if entry.file_type().is_file() && Self::is_image(entry.path()) {
                files.push(entry.into_path());
            }
        }

        debug!("Enumerated {} images under {}", files.len(), root.display());
        Ok(files)
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
    }

    /// Check if a file is a supported image
    pub fn is_image(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext_lower.as_str())
        } else {
            false
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
