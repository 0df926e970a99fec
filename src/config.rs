//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione del run di conversione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri della pipeline
//! - Fornisce validazione dei parametri (una sola volta, prima del run)
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `input_dir` / `output_dir`: Root di input e di output
//! - `quality`: Qualità WebP (0-100, default: 90)
//! - `honor_variants`: Applica la convenzione dei nomi 2x (default: true)
//! - `include_hidden`: Include file e directory nascosti (default: false)
//! - `workers`: Numero di worker paralleli per fan-out (default: 4)
//! - `directory_naming`: Policy di rename dei segmenti di directory (default: identity)
//! - `collision_mode`: Gestione collisioni nel rename (default: overwrite)
//! - `manifest_name`: Nome del manifest (default: "info.json")
//! - `encoder_method`: Metodo cwebp `-m` (0-6, default: 6)
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     quality: 80,
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::ConvertError;
use crate::naming::DirectoryNaming;
use crate::rename::CollisionMode;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default manifest file name, written at the output root
pub const DEFAULT_MANIFEST_NAME: &str = "info.json";

/// WebP quality, validated to 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Result<Self, ConvertError> {
        if value > Self::MAX {
            return Err(ConvertError::Validation(format!(
                "WebP quality must be between 0 and {}, got {}",
                Self::MAX,
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Quality {
    type Error = ConvertError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for a conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the input image tree
    pub input_dir: PathBuf,
    /// Root of the converted output tree (manifest is written here)
    pub output_dir: PathBuf,
    /// WebP quality (0-100)
    pub quality: u8,
    /// Apply the 2x variant naming convention and keep variants out of the manifest
    pub honor_variants: bool,
    /// Include dot-files and dot-directories during enumeration
    pub include_hidden: bool,
    /// Number of parallel workers per fan-out
    pub workers: usize,
    /// Rewrite rule for nested directory segments
    pub directory_naming: DirectoryNaming,
    /// What to do when two artifacts end up with the same final name
    pub collision_mode: CollisionMode,
    /// File name of the manifest written at the output root
    pub manifest_name: String,
    /// cwebp compression method (0 = fast, 6 = slowest/best)
    pub encoder_method: u8,
    /// Explicit path to the cwebp binary (None = look it up on PATH)
    pub cwebp_path: Option<PathBuf>,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            quality: 90,
            honor_variants: true,
            include_hidden: false,
            workers: 4,
            directory_naming: DirectoryNaming::Identity,
            collision_mode: CollisionMode::Overwrite,
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            encoder_method: 6,
            cwebp_path: None,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    ///
    /// The input directory is not checked here: a missing root is reported
    /// by enumeration as `DirectoryNotFound`.
    pub fn validate(&self) -> Result<(), ConvertError> {
        Quality::new(self.quality)?;

        if self.workers == 0 {
            return Err(ConvertError::Validation(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        if self.encoder_method > 6 {
            return Err(ConvertError::Validation(
                "Encoder method must be between 0 and 6".to_string(),
            ));
        }

        let manifest = Path::new(&self.manifest_name);
        if self.manifest_name.is_empty() || manifest.components().count() != 1 || manifest.file_name().is_none() {
            return Err(ConvertError::Validation(format!(
                "Manifest name must be a plain file name: {:?}",
                self.manifest_name
            )));
        }

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(ConvertError::Validation(format!(
                "Output path is not a directory: {}",
                self.output_dir.display()
            )));
        }

        Ok(())
    }

    /// Validated quality value
    pub fn quality(&self) -> Result<Quality, ConvertError> {
        Quality::new(self.quality)
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.quality = 101;
        assert!(config.validate().is_err());

        config.quality = 0;
        assert!(config.validate().is_ok());

        config.quality = 100;
        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 2;
        config.encoder_method = 7;
        assert!(config.validate().is_err());

        config.encoder_method = 4;
        config.manifest_name = "nested/info.json".to_string();
        assert!(config.validate().is_err());

        config.manifest_name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_path_must_be_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let config = Config {
            output_dir: file,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConvertError::Validation(_))));
    }

    #[test]
    fn test_quality_bounds() {
        assert_eq!(Quality::new(0).unwrap().value(), 0);
        assert_eq!(Quality::new(100).unwrap().value(), 100);
        assert!(Quality::new(101).is_err());
        assert!(Quality::try_from(255u8).is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.quality, 90);
        assert!(config.honor_variants);
        assert!(!config.include_hidden);
        assert_eq!(config.workers, 4);
        assert_eq!(config.manifest_name, "info.json");
        assert_eq!(config.directory_naming, DirectoryNaming::Identity);
        assert_eq!(config.collision_mode, CollisionMode::Overwrite);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            input_dir: PathBuf::from("/srv/assets"),
            output_dir: PathBuf::from("/srv/public"),
            quality: 75,
            honor_variants: false,
            workers: 8,
            directory_naming: DirectoryNaming::KebabCase,
            collision_mode: CollisionMode::Suffix,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.input_dir, PathBuf::from("/srv/assets"));
        assert_eq!(loaded_config.quality, 75);
        assert!(!loaded_config.honor_variants);
        assert_eq!(loaded_config.workers, 8);
        assert_eq!(loaded_config.directory_naming, DirectoryNaming::KebabCase);
        assert_eq!(loaded_config.collision_mode, CollisionMode::Suffix);
    }

    #[tokio::test]
    async fn test_config_load_rejects_invalid_quality() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "quality": 150 }"#).await.unwrap();

        assert!(Config::from_file(&config_path).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_config_file_yields_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config.quality, 90);
    }
}
