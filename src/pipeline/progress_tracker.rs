//! # Progress Tracking Module
//!
//! Tracker thread-safe condiviso dai task del fan-out di conversione.
//! Gestisce sia output JSON che progress bar tradizionale, più i messaggi
//! di log per-file.

use crate::json_output::JsonMessage;
use crate::pipeline::task::{ExtractionOutcome, FileOutcome};
use crate::progress::ProgressManager;
use tracing::{info, warn};

/// Tracker progress unificato per un run
#[derive(Clone)]
pub struct ProgressTracker {
    total_files: usize,
    json_output: bool,
    progress_manager: ProgressManager,
}

impl ProgressTracker {
    /// Crea un nuovo tracker
    pub fn new(total_files: usize, json_output: bool) -> Self {
        let progress_manager = if json_output {
            ProgressManager::hidden()
        } else {
            ProgressManager::new(total_files as u64)
        };

        Self {
            total_files,
            json_output,
            progress_manager,
        }
    }

    /// Gestisce completamento file con eventi JSON automatici
    pub fn handle_file_completion(&self, outcome: &FileOutcome) {
        let name = outcome.source().display_name();

        let message = match outcome {
            FileOutcome::Converted { artifact, .. } => {
                info!("{} has converted to {}", name, artifact.path.display());
                format!("[OK] {}", name)
            }
            FileOutcome::ConversionFailed { reason, .. } => {
                warn!("{} was a failure: {}", name, reason);
                format!("[ERROR] {}", name)
            }
            FileOutcome::RenameFailed { produced, reason, .. } => {
                match produced {
                    Some(produced) => warn!("{} could not be renamed: {}", produced.display(), reason),
                    None => warn!("{} was not converted: {}", name, reason),
                }
                format!("[RENAME ERROR] {}", name)
            }
            FileOutcome::Cancelled(_) => format!("[SKIP] {}", name),
        };

        if self.json_output {
            if let Some(event) = file_event(outcome) {
                event.emit();
            }
        }
        self.progress_manager.update(&message);
    }

    /// Logga l'esito di un'estrazione metadata
    pub fn handle_extraction(&self, outcome: &ExtractionOutcome) {
        if let ExtractionOutcome::Unreadable { source, reason } = outcome {
            warn!("Skipping {} in manifest: {}", source.display_name(), reason);
        }
    }

    /// Finalizza progress bar con il conteggio dei file completati
    pub fn finish(&self) {
        self.progress_manager
            .finish(&format!("All files were done ({}/{})", self.completed(), self.total_files));
    }

    pub fn completed(&self) -> u64 {
        self.progress_manager.position()
    }
}

/// `file_complete` event for an outcome; cancelled files emit nothing
fn file_event(outcome: &FileOutcome) -> Option<JsonMessage> {
    let source = outcome.source().path.clone();
    match outcome {
        FileOutcome::Converted { artifact, .. } => Some(JsonMessage::file_complete(
            source,
            Some(artifact.path.clone()),
            artifact.variant,
            None,
        )),
        FileOutcome::ConversionFailed { reason, .. } => {
            Some(JsonMessage::file_complete(source, None, false, Some(reason.clone())))
        }
        FileOutcome::RenameFailed {
            produced,
            variant,
            reason,
            ..
        } => Some(JsonMessage::file_complete(
            source,
            produced.clone(),
            *variant,
            Some(reason.clone()),
        )),
        FileOutcome::Cancelled(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_manager::SourceFile;
    use crate::rename::RenamedArtifact;
    use std::path::{Path, PathBuf};

    fn source(name: &str) -> SourceFile {
        SourceFile::from_path(Path::new("/in"), &Path::new("/in").join(name)).unwrap()
    }

    #[test]
    fn test_every_outcome_advances_progress() {
        let tracker = ProgressTracker::new(3, false);

        tracker.handle_file_completion(&FileOutcome::Converted {
            source: source("a.png"),
            artifact: RenamedArtifact {
                path: PathBuf::from("/out/a.webp"),
                variant: false,
            },
        });
        tracker.handle_file_completion(&FileOutcome::ConversionFailed {
            source: source("a.png"),
            reason: "boom".to_string(),
        });
        tracker.handle_file_completion(&FileOutcome::Cancelled(source("a.png")));

        assert_eq!(tracker.completed(), 3);
        tracker.finish();
    }

    #[test]
    fn test_rename_failure_event_reports_base_asset() {
        let outcome = FileOutcome::RenameFailed {
            source: source("hero.jpg"),
            produced: None,
            variant: false,
            reason: "name already taken".to_string(),
        };

        assert_eq!(
            file_event(&outcome),
            Some(JsonMessage::FileComplete {
                source: PathBuf::from("/in/hero.jpg"),
                output: None,
                variant: false,
                error: Some("name already taken".to_string()),
            })
        );
    }

    #[test]
    fn test_rename_failure_event_reports_variant_and_leftover() {
        let outcome = FileOutcome::RenameFailed {
            source: source("logo@2x.png"),
            produced: Some(PathBuf::from("/out/.logo@2x.1-0.part.webp")),
            variant: true,
            reason: "permission denied".to_string(),
        };

        match file_event(&outcome) {
            Some(JsonMessage::FileComplete { output, variant, .. }) => {
                assert!(variant);
                assert_eq!(output, Some(PathBuf::from("/out/.logo@2x.1-0.part.webp")));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(file_event(&FileOutcome::Cancelled(source("a.png"))), None);
    }
}
