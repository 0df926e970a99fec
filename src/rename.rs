//! # Rename Stage Module
//!
//! Decide il nome finale di ogni artifact prima dell'encoding (`reserve`) e,
//! dopo una conversione riuscita, sposta il file prodotto sul nome canonico
//! (`apply_naming_convention`).
//!
//! ## Responsabilità:
//! - Riconosce le varianti dal marker `@2x` nel nome base dell'artifact
//! - Calcola il nome finale con `naming::variant_output_stem`
//! - Esegue il rename sul filesystem (sovrascrive il target, last-writer-wins)
//! - Gestione opzionale delle collisioni tra artifact dello stesso run
//!
//! ## Collisioni:
//! - `Overwrite` (default): nessun controllo, vince l'ultimo che scrive
//! - `Fail`: un nome finale già reclamato nel run produce un `Rename` error
//! - `Suffix`: aggiunge `-1`, `-2`, ... fino a trovare un nome libero
//!
//! I nomi vengono reclamati per run, prima che l'encoder scriva, quindi due
//! sorgenti con lo stesso nome non si sovrascrivono e rieseguire la pipeline
//! sullo stesso output non è una collisione.

use crate::error::ConvertError;
use crate::naming;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Behaviour when two artifacts of one run share a final path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionMode {
    #[default]
    Overwrite,
    Fail,
    Suffix,
}

/// Final on-disk artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedArtifact {
    pub path: PathBuf,
    /// True for 2x variants, false for base assets
    pub variant: bool,
}

/// Applies the 2x naming convention to produced artifacts.
///
/// Cloning shares the per-run claim set.
#[derive(Clone)]
pub struct RenameStage {
    honor_variants: bool,
    collision_mode: CollisionMode,
    claimed: Arc<Mutex<HashSet<PathBuf>>>,
}

impl RenameStage {
    pub fn new(honor_variants: bool, collision_mode: CollisionMode) -> Self {
        Self {
            honor_variants,
            collision_mode,
            claimed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether a file stem is treated as a 2x variant in this run
    pub fn is_variant(&self, stem: &str) -> bool {
        self.honor_variants && naming::has_source_marker(stem)
    }

    /// Decide the final name for `output` and claim it, before anything is written.
    ///
    /// `output` is the canonical `<destination>/<stem>.webp` of a source.
    pub fn reserve(&self, output: &Path) -> Result<RenamedArtifact, ConvertError> {
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConvertError::InvalidName(output.display().to_string()))?;
        let extension = output
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let dir = output.parent().unwrap_or(Path::new(""));

        let variant = self.is_variant(stem);
        let final_stem = match naming::variant_output_stem(stem)? {
            Some(renamed) if variant => renamed,
            _ => stem.to_string(),
        };

        let path = self
            .claim(dir, &final_stem, extension)
            .map_err(|reason| ConvertError::Rename {
                path: output.to_path_buf(),
                reason,
            })?;

        Ok(RenamedArtifact { path, variant })
    }

    /// Give back a reserved name whose conversion failed
    pub fn release(&self, artifact: &RenamedArtifact) {
        if let Ok(mut claimed) = self.claimed.lock() {
            claimed.remove(&artifact.path);
        }
    }

    /// Move `produced` onto its reserved final name
    pub async fn apply_naming_convention(
        &self,
        produced: &Path,
        artifact: RenamedArtifact,
    ) -> Result<RenamedArtifact, ConvertError> {
        if artifact.path != produced {
            replace_file(produced, &artifact.path)
                .await
                .map_err(|e| ConvertError::Rename {
                    path: produced.to_path_buf(),
                    reason: e.to_string(),
                })?;
            debug!("Renamed {} -> {}", produced.display(), artifact.path.display());
        }

        Ok(artifact)
    }

    /// Reserve the final path for this run according to the collision mode
    fn claim(&self, dir: &Path, stem: &str, extension: &str) -> Result<PathBuf, String> {
        let file_name = |stem: &str| {
            if extension.is_empty() {
                stem.to_string()
            } else {
                format!("{}.{}", stem, extension)
            }
        };
        let candidate = dir.join(file_name(stem));

        if self.collision_mode == CollisionMode::Overwrite {
            return Ok(candidate);
        }

        let mut claimed = self
            .claimed
            .lock()
            .map_err(|_| "rename claim set poisoned".to_string())?;

        if claimed.insert(candidate.clone()) {
            return Ok(candidate);
        }

        match self.collision_mode {
            CollisionMode::Fail => Err(format!(
                "{} is already produced by another file in this run",
                candidate.display()
            )),
            _ => {
                let mut n = 1usize;
                loop {
                    let next = dir.join(file_name(&format!("{}-{}", stem, n)));
                    if claimed.insert(next.clone()) {
                        return Ok(next);
                    }
                    n += 1;
                }
            }
        }
    }
}

/// Rename that replaces an existing target on every platform
async fn replace_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if cfg!(windows) && tokio::fs::try_exists(to).await.unwrap_or(false) {
        tokio::fs::remove_file(to).await?;
    }
    tokio::fs::rename(from, to).await
}
