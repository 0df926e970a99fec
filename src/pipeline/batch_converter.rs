//! # Batch Converter Main Orchestrator
//!
//! Orchestratore del run: enumera le immagini, lancia in parallelo i due
//! fan-out (conversione + rename per ogni file, estrazione metadata per ogni
//! immagine base), li attende entrambi e scrive il manifest una sola volta.
//!
//! ## Stati del run:
//! ```text
//! Idle → Enumerating → Converting → Aggregating → Done
//!            │              (lista vuota) ↗
//!            └──────────────→ Failed
//! ```
//!
//! ## Concorrenza:
//! - Un `Semaphore` per fan-out, con `workers` permessi ciascuno
//! - I permessi vengono acquisiti dentro i task: i due fan-out non si bloccano a vicenda
//! - I risultati tornano tramite i `JoinHandle`, niente accumulatori condivisi
//!
//! ## Interruzione:
//! - Prima o durante l'enumerazione il run termina in `Failed` (`Cancelled`)
//! - Dopo l'avvio dei fan-out i task già partiti terminano, quelli non ancora
//!   partiti vengono saltati; il run aggrega e termina in `Done`

use crate::{
    config::{Config, Quality},
    error::ConvertError,
    file_manager::{FileManager, SourceFile},
    image_processor::{CwebpEncoder, ImageProcessor, WebpEncoder},
    json_output::JsonMessage,
    manifest::Manifest,
    metadata::{DimensionReader, MetadataExtractor},
    naming,
    pipeline::{
        path_resolver::PathResolver,
        progress_tracker::ProgressTracker,
        task::{ConversionTask, ExtractionOutcome, FileOutcome},
    },
    progress::RunStats,
    rename::RenameStage,
};
use futures::future::{join, join_all};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Enumerating,
    Converting,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Enumerating => "enumerating",
            Self::Converting => "converting",
            Self::Aggregating => "aggregating",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Final report of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub stats: RunStats,
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
    /// Per-file failures (source path, reason) from both fan-outs
    pub failures: Vec<(PathBuf, String)>,
    pub cancelled: bool,
}

/// Orchestratore principale
pub struct BatchConverter {
    config: Config,
    encoder: Arc<dyn WebpEncoder>,
    extractor: MetadataExtractor,
    stop_receiver: Option<watch::Receiver<bool>>,
    state: RunState,
}

impl BatchConverter {
    /// Crea un orchestratore che usa `cwebp`
    pub fn new(config: Config) -> Result<Self, ConvertError> {
        let encoder = Arc::new(CwebpEncoder::from_config(&config));
        Self::with_encoder(config, encoder)
    }

    /// Crea un orchestratore con un encoder esplicito
    pub fn with_encoder(config: Config, encoder: Arc<dyn WebpEncoder>) -> Result<Self, ConvertError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder,
            extractor: MetadataExtractor::default(),
            stop_receiver: None,
            state: RunState::Idle,
        })
    }

    /// Sostituisce il lettore delle dimensioni usato dal fan-out di estrazione
    pub fn with_dimension_reader(mut self, reader: Arc<dyn DimensionReader>) -> Self {
        self.extractor = MetadataExtractor::new(reader);
        self
    }

    /// Collega un canale di stop: `true` interrompe lo scheduling di nuovi job
    pub fn with_cancellation(mut self, stop_receiver: watch::Receiver<bool>) -> Self {
        self.stop_receiver = Some(stop_receiver);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Esegue il run completo
    pub async fn run(&mut self) -> Result<RunReport, ConvertError> {
        let start_time = Instant::now();

        match self.execute(start_time).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.transition(RunState::Failed);
                if self.config.json_output {
                    JsonMessage::error(&e).emit();
                }
                error!("Run failed: {}", e);
                Err(e)
            }
        }
    }

    async fn execute(&mut self, start_time: Instant) -> Result<RunReport, ConvertError> {
        self.transition(RunState::Enumerating);
        self.check_not_cancelled()?;

        let paths = FileManager::enumerate(
            &self.config.input_dir,
            self.config.include_hidden,
            Some(&self.config.output_dir),
        )?;
        self.check_not_cancelled()?;

        let root = self.config.input_dir.canonicalize()?;
        let mut stats = RunStats::new(paths.len());
        let mut failures = Vec::new();
        let mut sources = Vec::with_capacity(paths.len());

        for path in paths {
            match SourceFile::from_path(&root, &path) {
                Ok(source) => sources.push(source),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    stats.add_conversion_failure();
                    failures.push((path, e.to_string()));
                }
            }
        }

        self.emit_start_message(sources.len());

        let (outcomes, extractions) = if sources.is_empty() {
            info!("No images found to convert");
            (Vec::new(), Vec::new())
        } else {
            let quality = self.config.quality()?;
            self.encoder.validate().await?;
            self.transition(RunState::Converting);
            self.process_files_concurrently(&sources, quality).await
        };

        self.transition(RunState::Aggregating);

        for outcome in outcomes {
            match outcome {
                FileOutcome::Converted { artifact, .. } => {
                    let size = tokio::fs::metadata(&artifact.path).await.map(|m| m.len()).unwrap_or(0);
                    stats.add_converted(artifact.variant, size);
                }
                FileOutcome::ConversionFailed { source, reason } => {
                    stats.add_conversion_failure();
                    failures.push((source.path, reason));
                }
                FileOutcome::RenameFailed { source, reason, .. } => {
                    stats.add_rename_failure();
                    failures.push((source.path, reason));
                }
                FileOutcome::Cancelled(_) => stats.add_cancelled(),
            }
        }

        let mut entries = Vec::new();
        for outcome in extractions {
            match outcome {
                ExtractionOutcome::Extracted(info) => entries.push(info),
                ExtractionOutcome::Unreadable { source, reason } => {
                    stats.add_unreadable();
                    failures.push((source.path, reason));
                }
                ExtractionOutcome::Cancelled(_) => stats.add_cancelled(),
            }
        }

        let manifest = Manifest::from_entries(entries);
        stats.manifest_entries = manifest.len();
        let manifest_path = manifest
            .write(&self.config.output_dir, &self.config.manifest_name)
            .await?;

        if self.config.json_output {
            JsonMessage::Manifest {
                path: manifest_path.clone(),
                entries: manifest.len(),
            }
            .emit();
        }

        self.transition(RunState::Done);
        let cancelled = stats.cancelled > 0;
        self.print_final_stats(&stats, start_time.elapsed().as_secs_f64());

        Ok(RunReport {
            state: self.state,
            stats,
            manifest,
            manifest_path,
            failures,
            cancelled,
        })
    }

    /// Lancia i due fan-out e li attende entrambi
    async fn process_files_concurrently(
        &self,
        sources: &[SourceFile],
        quality: Quality,
    ) -> (Vec<FileOutcome>, Vec<ExtractionOutcome>) {
        let conversion_permits = Arc::new(Semaphore::new(self.config.workers));
        let extraction_permits = Arc::new(Semaphore::new(self.config.workers));
        let tracker = ProgressTracker::new(sources.len(), self.config.json_output);

        let task = ConversionTask::new(
            ImageProcessor::new(self.encoder.clone(), self.config.directory_naming),
            RenameStage::new(self.config.honor_variants, self.config.collision_mode),
            self.extractor.clone(),
            quality,
            self.config.output_dir.clone(),
        );

        let mut conversions = Vec::with_capacity(sources.len());
        let mut extractions = Vec::new();

        for source in sources {
            let conversion_task = task.clone();
            let permits = conversion_permits.clone();
            let stop = self.stop_receiver.clone();
            let tracker_clone = tracker.clone();
            let job_source = source.clone();

            let handle = tokio::spawn(async move {
                // il permesso viene rilasciato quando il task finisce
                let _permit = permits.acquire_owned().await;
                let outcome = if is_stop_requested(&stop) {
                    FileOutcome::Cancelled(job_source)
                } else {
                    conversion_task.process(job_source).await
                };
                tracker_clone.handle_file_completion(&outcome);
                outcome
            });
            conversions.push((source.clone(), handle));

            if PathResolver::is_variant(source, self.config.honor_variants) {
                debug!(
                    "Not describing 2x variant {} (base {})",
                    source.display_name(),
                    naming::strip_variant_marker(&source.stem).unwrap_or_default()
                );
                continue;
            }

            let permits = extraction_permits.clone();
            let stop = self.stop_receiver.clone();
            let tracker_clone = tracker.clone();
            let extraction_task = task.clone();
            let job_source = source.clone();

            let handle = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await;
                let outcome = if is_stop_requested(&stop) {
                    ExtractionOutcome::Cancelled(job_source)
                } else {
                    extraction_task.extract(job_source).await
                };
                tracker_clone.handle_extraction(&outcome);
                outcome
            });
            extractions.push((source.clone(), handle));
        }

        let conversions = join_all(conversions.into_iter().map(|(source, handle)| async move {
            handle.await.unwrap_or_else(|e| FileOutcome::ConversionFailed {
                source,
                reason: format!("conversion task panicked: {}", e),
            })
        }));

        let extractions = join_all(extractions.into_iter().map(|(source, handle)| async move {
            handle.await.unwrap_or_else(|e| ExtractionOutcome::Unreadable {
                source,
                reason: format!("extraction task panicked: {}", e),
            })
        }));

        let (outcomes, extracted) = join(conversions, extractions).await;
        tracker.finish();
        (outcomes, extracted)
    }

    fn check_not_cancelled(&self) -> Result<(), ConvertError> {
        if is_stop_requested(&self.stop_receiver) {
            return Err(ConvertError::Cancelled);
        }
        Ok(())
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Invia messaggio di inizio
    fn emit_start_message(&self, total_files: usize) {
        if self.config.json_output {
            JsonMessage::start(&self.config, total_files).emit();
            return;
        }

        info!("Converting images in: {}", self.config.input_dir.display());
        info!("Output directory: {}", self.config.output_dir.display());
        info!(
            "WebP quality: {} | workers: {} | 2x naming: {}",
            self.config.quality,
            self.config.workers,
            if self.config.honor_variants { "on" } else { "off" }
        );
        info!("Found {} images to process", total_files);
    }

    /// Stampa statistiche finali
    fn print_final_stats(&self, stats: &RunStats, duration: f64) {
        if self.config.json_output {
            JsonMessage::complete(self.state, stats.clone(), duration).emit();
            return;
        }

        info!("=== Conversion Complete ===");
        info!("Images found: {}", stats.files_found);
        info!("Converted: {} ({} 2x variants)", stats.converted, stats.variants_renamed);
        info!("Conversion failures: {}", stats.conversion_failed);
        info!("Rename failures: {}", stats.rename_failed);
        info!("Unreadable images: {}", stats.unreadable);
        if stats.failures() > 0 {
            warn!("Files with problems: {}", stats.failures());
        }
        if stats.cancelled > 0 {
            warn!("Skipped after stop request: {}", stats.cancelled);
        }
        info!("Manifest entries: {}", stats.manifest_entries);
        info!("Total written: {}", FileManager::format_size(stats.bytes_written));
        info!("Duration: {:.2}s", duration);
    }
}

fn is_stop_requested(stop: &Option<watch::Receiver<bool>>) -> bool {
    stop.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
}
