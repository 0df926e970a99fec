//! # Conversion Task Module
//!
//! Worker per l'elaborazione di un singolo file, separato dall'orchestratore.
//! Ogni errore viene catturato qui, al confine del task, e trasformato in un
//! valore (`FileOutcome` / `ExtractionOutcome`): nulla di quello che succede a
//! un file può interrompere il batch.

use crate::config::Quality;
use crate::error::ConvertError;
use crate::file_manager::SourceFile;
use crate::image_processor::{ConversionJob, ConversionResult, ImageProcessor};
use crate::metadata::{ImageInfo, MetadataExtractor};
use crate::rename::{RenameStage, RenamedArtifact};
use std::path::PathBuf;
use tracing::debug;

/// Result of the conversion fan-out for one file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Converted { source: SourceFile, artifact: RenamedArtifact },
    ConversionFailed { source: SourceFile, reason: String },
    /// The final name could not be claimed (`produced` is `None`, nothing was
    /// encoded) or the staged artifact could not be moved; it is left at `produced`
    RenameFailed {
        source: SourceFile,
        produced: Option<PathBuf>,
        variant: bool,
        reason: String,
    },
    Cancelled(SourceFile),
}

impl FileOutcome {
    pub fn source(&self) -> &SourceFile {
        match self {
            Self::Converted { source, .. }
            | Self::ConversionFailed { source, .. }
            | Self::RenameFailed { source, .. }
            | Self::Cancelled(source) => source,
        }
    }
}

/// Result of the metadata fan-out for one base asset
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Extracted(ImageInfo),
    Unreadable { source: SourceFile, reason: String },
    Cancelled(SourceFile),
}

/// Worker per conversione + rename di un singolo file
#[derive(Clone)]
pub struct ConversionTask {
    processor: ImageProcessor,
    rename_stage: RenameStage,
    extractor: MetadataExtractor,
    quality: Quality,
    output_root: PathBuf,
}

impl ConversionTask {
    pub fn new(
        processor: ImageProcessor,
        rename_stage: RenameStage,
        extractor: MetadataExtractor,
        quality: Quality,
        output_root: PathBuf,
    ) -> Self {
        Self {
            processor,
            rename_stage,
            extractor,
            quality,
            output_root,
        }
    }

    /// Converte un file e applica la convenzione dei nomi.
    ///
    /// Il nome finale viene reclamato prima dell'encoding, così due sorgenti
    /// con lo stesso nome non scrivono mai sullo stesso file.
    pub async fn process(&self, source: SourceFile) -> FileOutcome {
        let variant = self.rename_stage.is_variant(&source.stem);

        let reserved = match self
            .processor
            .output_path(&source, &self.output_root)
            .and_then(|output| self.rename_stage.reserve(&output))
        {
            Ok(reserved) => reserved,
            Err(e @ ConvertError::Rename { .. }) => {
                return FileOutcome::RenameFailed {
                    source,
                    produced: None,
                    variant,
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                return FileOutcome::ConversionFailed {
                    source,
                    reason: e.to_string(),
                }
            }
        };

        let job = ConversionJob {
            source,
            quality: self.quality,
            output_root: self.output_root.clone(),
        };

        match self.processor.convert_job(job).await {
            ConversionResult::Failed { source, reason } => {
                self.rename_stage.release(&reserved);
                FileOutcome::ConversionFailed { source, reason }
            }
            ConversionResult::Converted { source, produced } => {
                debug!("Converted {} -> {}", source.path.display(), produced.display());
                match self.rename_stage.apply_naming_convention(&produced, reserved).await {
                    Ok(artifact) => FileOutcome::Converted { source, artifact },
                    Err(e) => FileOutcome::RenameFailed {
                        source,
                        produced: Some(produced),
                        variant,
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    /// Estrae le dimensioni di un'immagine base
    pub async fn extract(&self, source: SourceFile) -> ExtractionOutcome {
        match self.extractor.extract(&source).await {
            Ok(info) => ExtractionOutcome::Extracted(info),
            Err(e) => ExtractionOutcome::Unreadable {
                source,
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::DirectoryNaming;
    use crate::rename::CollisionMode;
    use crate::test_helpers::{write_png, CopyEncoder, FailingEncoder};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn task(encoder: Arc<dyn crate::image_processor::WebpEncoder>, output: PathBuf, mode: CollisionMode) -> ConversionTask {
        ConversionTask::new(
            ImageProcessor::new(encoder, DirectoryNaming::Identity),
            RenameStage::new(true, mode),
            MetadataExtractor::default(),
            Quality::new(90).unwrap(),
            output,
        )
    }

    fn visible_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_variant_converted_and_renamed() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in");
        std::fs::create_dir_all(input.join("icons")).unwrap();
        let path = input.join("icons/logo@2x.png");
        write_png(&path, 8, 8);

        let output = temp_dir.path().join("out");
        let source = SourceFile::from_path(&input, &path).unwrap();
        let outcome = task(Arc::new(CopyEncoder), output.clone(), CollisionMode::Overwrite)
            .process(source)
            .await;

        match outcome {
            FileOutcome::Converted { artifact, .. } => {
                assert_eq!(artifact.path, output.join("icons/logo_2x.webp"));
                assert!(artifact.variant);
                assert!(artifact.path.exists());
                assert_eq!(visible_files(&output.join("icons")), vec!["logo_2x.webp"]);
                assert_eq!(std::fs::read_dir(output.join("icons")).unwrap().count(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    /// Converts `hero.jpg` (4x4) then `hero.png` (6x6) into one directory
    async fn convert_same_stem(mode: CollisionMode) -> (TempDir, Vec<FileOutcome>) {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        write_png(&input.join("hero.jpg"), 4, 4);
        write_png(&input.join("hero.png"), 6, 6);

        let task = task(Arc::new(CopyEncoder), temp_dir.path().join("out"), mode);
        let mut outcomes = Vec::new();
        for name in ["hero.jpg", "hero.png"] {
            let source = SourceFile::from_path(&input, &input.join(name)).unwrap();
            outcomes.push(task.process(source).await);
        }
        (temp_dir, outcomes)
    }

    fn dimensions(path: &Path) -> (u32, u32) {
        use crate::metadata::{DimensionReader, ImageHeaderReader};
        ImageHeaderReader.read_dimensions(path).unwrap()
    }

    #[tokio::test]
    async fn test_same_stem_suffix_mode_keeps_both() {
        let (temp_dir, outcomes) = convert_same_stem(CollisionMode::Suffix).await;
        let out = temp_dir.path().join("out");

        assert!(outcomes.iter().all(|o| matches!(o, FileOutcome::Converted { .. })));
        assert_eq!(visible_files(&out), vec!["hero-1.webp", "hero.webp"]);
        assert_eq!(dimensions(&out.join("hero.webp")), (4, 4));
        assert_eq!(dimensions(&out.join("hero-1.webp")), (6, 6));
    }

    #[tokio::test]
    async fn test_same_stem_fail_mode_keeps_first() {
        let (temp_dir, outcomes) = convert_same_stem(CollisionMode::Fail).await;
        let out = temp_dir.path().join("out");

        assert!(matches!(outcomes[0], FileOutcome::Converted { .. }));
        match &outcomes[1] {
            FileOutcome::RenameFailed { produced, variant, .. } => {
                assert_eq!(produced, &None);
                assert!(!variant);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(visible_files(&out), vec!["hero.webp"]);
        assert_eq!(dimensions(&out.join("hero.webp")), (4, 4));
        // nothing was encoded for the rejected file
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_same_stem_overwrite_mode_last_writer_wins() {
        let (temp_dir, outcomes) = convert_same_stem(CollisionMode::Overwrite).await;
        let out = temp_dir.path().join("out");

        assert!(outcomes.iter().all(|o| matches!(o, FileOutcome::Converted { .. })));
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
        assert_eq!(dimensions(&out.join("hero.webp")), (6, 6));
    }

    #[tokio::test]
    async fn test_conversion_failure_releases_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.png");
        write_png(&path, 8, 8);
        let out = temp_dir.path().join("out");
        let source = SourceFile::from_path(temp_dir.path(), &path).unwrap();

        let stage = RenameStage::new(true, CollisionMode::Fail);
        let failing = ConversionTask::new(
            ImageProcessor::new(Arc::new(FailingEncoder), DirectoryNaming::Identity),
            stage.clone(),
            MetadataExtractor::default(),
            Quality::new(90).unwrap(),
            out.clone(),
        );
        let outcome = failing.process(source.clone()).await;
        assert_eq!(outcome.source(), &source);
        assert!(matches!(outcome, FileOutcome::ConversionFailed { .. }));

        // the claim was given back, so the same name is still available
        assert_eq!(stage.reserve(&out.join("a.webp")).unwrap().path, out.join("a.webp"));
    }

    #[tokio::test]
    async fn test_extract_unreadable_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("b.jpg");
        std::fs::write(&path, b"garbage").unwrap();

        let source = SourceFile::from_path(temp_dir.path(), &path).unwrap();
        let task = task(Arc::new(CopyEncoder), temp_dir.path().join("out"), CollisionMode::Overwrite);
        assert!(matches!(task.extract(source).await, ExtractionOutcome::Unreadable { .. }));
    }
}
