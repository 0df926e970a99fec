//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore della pipeline di conversione.
//!
//! ## Responsabilità:
//! - Definisce `ConvertError` enum per categorizzare tutti gli errori possibili
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `DirectoryNotFound`: Directory di input mancante (fatale, solo in enumerazione)
//! - `UnreadableImage`: Immagine non decodificabile (per-file, esclusa dal manifest)
//! - `Conversion`: Encoder WebP fallito (per-file)
//! - `Rename`: Rename della variante 2x fallito (per-file, artifact orfano)
//! - `InvalidName`: Nome vuoto o non valido nel Path Transform (per-file)
//! - `MissingDependency`: Encoder esterno mancante (cwebp)
//! - `Validation`: Errori di validazione configurazione
//! - `Manifest`: Errore di serializzazione/scrittura del manifest
//! - `Cancelled`: Run interrotto prima dell'avvio delle conversioni
//!
//! ## Esempio:
//! ```rust,ignore
//! if !root.is_dir() {
//!     return Err(ConvertError::DirectoryNotFound(root.to_path_buf()));
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for the conversion pipeline
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Unreadable image {}: {reason}", path.display())]
    UnreadableImage { path: PathBuf, reason: String },

    #[error("Conversion failed for {}: {reason}", path.display())]
    Conversion { path: PathBuf, reason: String },

    #[error("Rename failed for {}: {reason}", path.display())]
    Rename { path: PathBuf, reason: String },

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Configuration error: {0}")]
    Validation(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Run cancelled before processing started")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_path() {
        let err = ConvertError::Conversion {
            path: PathBuf::from("/in/a.png"),
            reason: "cwebp exited with status 1".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("/in/a.png"));
        assert!(message.contains("status 1"));
    }
}
