//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche del run.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` per feedback real-time
//! - Tally di conversioni, rename, errori e voci del manifest
//! - Report finale con statistiche aggregate
//!
//! ## Statistiche tracciate:
//! - **files_found**: Immagini trovate in enumerazione
//! - **converted**: Artifact WebP prodotti (dopo il rename)
//! - **variants_renamed**: Varianti 2x rinominate
//! - **conversion_failed** / **rename_failed**: Errori per-file del fan-out di conversione
//! - **unreadable**: Immagini non decodificabili (escluse dal manifest)
//! - **manifest_entries**: Voci scritte nel manifest
//! - **cancelled**: Job non avviati per interruzione
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 150/240 (62%) [OK] hero.png
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Manages the progress bar of the conversion fan-out
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A manager that never draws (JSON mode, tests)
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Tallies of one run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub files_found: usize,
    pub converted: usize,
    pub variants_renamed: usize,
    pub conversion_failed: usize,
    pub rename_failed: usize,
    pub unreadable: usize,
    pub manifest_entries: usize,
    pub cancelled: usize,
    pub bytes_written: u64,
}

impl RunStats {
    pub fn new(files_found: usize) -> Self {
        Self {
            files_found,
            ..Self::default()
        }
    }

    pub fn add_converted(&mut self, variant: bool, size: u64) {
        self.converted += 1;
        if variant {
            self.variants_renamed += 1;
        }
        self.bytes_written += size;
    }

    pub fn add_conversion_failure(&mut self) {
        self.conversion_failed += 1;
    }

    pub fn add_rename_failure(&mut self) {
        self.rename_failed += 1;
    }

    pub fn add_unreadable(&mut self) {
        self.unreadable += 1;
    }

    pub fn add_cancelled(&mut self) {
        self.cancelled += 1;
    }

    /// Per-file failures across both fan-outs
    pub fn failures(&self) -> usize {
        self.conversion_failed + self.rename_failed + self.unreadable
    }
}
