//! # Pipeline Module
//!
//! Pipeline di conversione suddivisa in sottomoduli:
//! - `batch_converter`: Orchestratore del run e macchina a stati
//! - `task`: Worker per singoli file (conversione + rename, estrazione metadata)
//! - `progress_tracker`: Gestione progress unificata
//! - `path_resolver`: Logica di calcolo path centralizzata

pub mod batch_converter;
pub mod path_resolver;
pub mod progress_tracker;
pub mod task;

pub use batch_converter::{BatchConverter, RunReport, RunState};
pub use path_resolver::PathResolver;
pub use progress_tracker::ProgressTracker;
pub use task::{ConversionTask, ExtractionOutcome, FileOutcome};
