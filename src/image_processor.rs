//! # Image Processing Module
//!
//! Questo modulo gestisce la conversione delle immagini in WebP delegando
//! l'encoding a un tool esterno (`cwebp`).
//!
//! ## Pipeline di Conversione
//!
//! 1. **Calcolo directory di destinazione**: root di output + Path Transform
//!    della directory relativa del sorgente
//! 2. **Creazione directory**: `create_dir_all`, idempotente anche con più task
//!    che condividono la stessa sottodirectory nuova
//! 3. **Encoding**: `cwebp -q <quality> -m <method> -mt <input> -o <staging>`, dove
//!    `<staging>` è un file nascosto unico per conversione (`.<stem>.<pid>-<n>.part.webp`)
//! 4. **Verifica**: l'artifact deve esistere e non essere vuoto; altrimenti
//!    il file di staging viene rimosso
//!
//! ## Error Handling e Resilienza
//!
//! Ogni errore (encoder fallito, destinazione non scrivibile, formato non
//! supportato, nome di directory non valido) diventa un
//! `ConversionResult::Failed` con un motivo leggibile. Nessun errore di un
//! singolo file interrompe il batch.
//!
//! ## Encoder
//!
//! L'encoder è dietro il trait [`WebpEncoder`], così il resto della pipeline
//! non dipende da come viene prodotto il WebP.
//!
//! ```text
//! Input:  /in/Summer Trip/hero@2x.png
//! Root:   /out
//! Output: /out/Summer Trip/.hero@2x.<pid>-<n>.part.webp
//! Final:  /out/Summer Trip/hero_2x.webp   (rename stage)
//! ```

use crate::config::{Config, Quality};
use crate::error::ConvertError;
use crate::file_manager::{FileManager, SourceFile};
use crate::naming::DirectoryNaming;
use crate::pipeline::path_resolver::PathResolver;
use crate::platform::PlatformCommands;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, warn};

/// Extension of every produced artifact
pub const WEBP_EXTENSION: &str = "webp";

/// One conversion request, consumed exactly once
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub source: SourceFile,
    pub quality: Quality,
    pub output_root: PathBuf,
}

/// Outcome of one conversion
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionResult {
    Converted { source: SourceFile, produced: PathBuf },
    Failed { source: SourceFile, reason: String },
}

/// An encoder able to write a WebP file from a source image
#[async_trait]
pub trait WebpEncoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Encodes `input` into `output` at the given quality.
    async fn encode(&self, input: &Path, output: &Path, quality: Quality) -> Result<(), ConvertError>;

    /// Validates that the encoder is installed and usable.
    async fn validate(&self) -> Result<(), ConvertError>;
}

/// Encoder backed by the `cwebp` command line tool
pub struct CwebpEncoder {
    binary: Option<PathBuf>,
    method: u8,
}

impl CwebpEncoder {
    pub fn new(binary: Option<PathBuf>, method: u8) -> Self {
        Self { binary, method }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cwebp_path.clone(), config.encoder_method)
    }

    /// Command line arguments for one conversion
    pub fn build_args(&self, input: &Path, output: &Path, quality: Quality) -> Vec<String> {
        vec![
            "-q".to_string(),
            quality.to_string(),
            "-m".to_string(),
            self.method.to_string(),
            "-mt".to_string(),
            "-quiet".to_string(),
            input.to_string_lossy().into_owned(),
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl WebpEncoder for CwebpEncoder {
    fn name(&self) -> &str {
        "cwebp"
    }

    async fn encode(&self, input: &Path, output: &Path, quality: Quality) -> Result<(), ConvertError> {
        let platform = PlatformCommands::instance();
        let tool_path = platform.resolve("cwebp", self.binary.as_deref());
        let args = self.build_args(input, output, quality);
        debug!("Running {:?} {:?}", tool_path, args);

        let start_time = std::time::Instant::now();
        let result = Command::new(&tool_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| ConvertError::Conversion {
                path: input.to_path_buf(),
                reason: format!("failed to start {}: {}", tool_path.display(), e),
            })?;
        let elapsed = start_time.elapsed();

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            warn!("cwebp failed after {:?} on {}", elapsed, input.display());
            return Err(ConvertError::Conversion {
                path: input.to_path_buf(),
                reason: format!("cwebp exited with {}: {}", result.status, stderr.trim()),
            });
        }

        debug!("cwebp converted {} in {:?}", input.display(), elapsed);
        Ok(())
    }

    async fn validate(&self) -> Result<(), ConvertError> {
        let platform = PlatformCommands::instance();
        if platform.is_command_available("cwebp", self.binary.as_deref()).await {
            Ok(())
        } else {
            Err(ConvertError::MissingDependency(
                "cwebp is required for WebP conversion (install the libwebp/webp package)".to_string(),
            ))
        }
    }
}

/// Conversion engine: runs one job through the encoder
#[derive(Clone)]
pub struct ImageProcessor {
    encoder: Arc<dyn WebpEncoder>,
    directory_naming: DirectoryNaming,
}

impl ImageProcessor {
    pub fn new(encoder: Arc<dyn WebpEncoder>, directory_naming: DirectoryNaming) -> Self {
        Self {
            encoder,
            directory_naming,
        }
    }

    /// Destination directory of a source under `output_root`
    pub fn destination_dir(&self, source: &SourceFile, output_root: &Path) -> Result<PathBuf, ConvertError> {
        PathResolver::destination_dir(source, output_root, self.directory_naming)
    }

    /// Canonical `<destination>/<stem>.webp` of a source, before the 2x rename
    pub fn output_path(&self, source: &SourceFile, output_root: &Path) -> Result<PathBuf, ConvertError> {
        PathResolver::output_path(source, output_root, self.directory_naming)
    }

    /// Convert one job. Never fails: every error becomes `ConversionResult::Failed`.
    pub async fn convert_job(&self, job: ConversionJob) -> ConversionResult {
        let destination = match self.destination_dir(&job.source, &job.output_root) {
            Ok(dir) => dir,
            Err(e) => {
                return ConversionResult::Failed {
                    source: job.source,
                    reason: e.to_string(),
                }
            }
        };

        self.convert(job.source, &destination, job.quality).await
    }

    /// Convert `source` into a staging file under `destination_dir`.
    ///
    /// The staging name starts with `.<stem>.` and is unique per conversion;
    /// the rename stage moves it onto the final name.
    pub async fn convert(&self, source: SourceFile, destination_dir: &Path, quality: Quality) -> ConversionResult {
        match self.try_convert(&source, destination_dir, quality).await {
            Ok(produced) => ConversionResult::Converted { source, produced },
            Err(e) => ConversionResult::Failed {
                reason: e.to_string(),
                source,
            },
        }
    }

    async fn try_convert(
        &self,
        source: &SourceFile,
        destination_dir: &Path,
        quality: Quality,
    ) -> Result<PathBuf, ConvertError> {
        if !FileManager::is_image(&source.path) {
            return Err(ConvertError::Conversion {
                path: source.path.clone(),
                reason: format!("unsupported source format {:?}", source.extension),
            });
        }

        // create_dir_all treats an already existing directory as success
        tokio::fs::create_dir_all(destination_dir)
            .await
            .map_err(|e| ConvertError::Conversion {
                path: source.path.clone(),
                reason: format!("cannot create {}: {}", destination_dir.display(), e),
            })?;

        let staging = destination_dir.join(staging_name(&source.stem));
        if let Err(e) = self.encoder.encode(&source.path, &staging, quality).await {
            discard(&staging).await;
            return Err(e);
        }

        let written = tokio::fs::metadata(&staging).await.map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            discard(&staging).await;
            return Err(ConvertError::Conversion {
                path: source.path.clone(),
                reason: format!("{} reported success but wrote nothing", self.encoder.name()),
            });
        }

        Ok(staging)
    }
}

/// Hidden, per-conversion file name: `.<stem>.<pid>-<n>.part.webp`
fn staging_name(stem: &str) -> String {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);
    let n = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(".{}.{}-{}.part.{}", stem, std::process::id(), n, WEBP_EXTENSION)
}

async fn discard(staging: &Path) {
    if tokio::fs::remove_file(staging).await.is_ok() {
        debug!("Removed partial output {}", staging.display());
    }
}
