//! # WebP Batch Converter Library
//!
//! Modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per le diverse fasi
//! - `naming`: Convenzione dei nomi 2x e rename dei segmenti di directory
//! - `file_manager`: Discovery delle immagini nell'albero di input
//! - `metadata`: Lettura delle dimensioni intrinseche
//! - `image_processor`: Conversione WebP tramite encoder esterno
//! - `rename`: Applicazione della convenzione dei nomi sugli artefatti
//! - `manifest`: Manifest JSON delle immagini base
//! - `pipeline`: Orchestratore del run e worker
//! - `progress` / `json_output`: Progress bar, statistiche, eventi JSON
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use webp_batch::{BatchConverter, Config};
//!
//! # async fn example() -> Result<(), webp_batch::ConvertError> {
//! let config = Config {
//!     input_dir: "assets".into(),
//!     output_dir: "public/img".into(),
//!     ..Default::default()
//! };
//! let report = BatchConverter::new(config)?.run().await?;
//! println!("{} entries", report.manifest.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod json_output;
pub mod manifest;
pub mod metadata;
pub mod naming;
pub mod pipeline;
pub mod platform;
pub mod progress;
pub mod rename;

#[cfg(test)]
mod test_helpers;

pub use config::{Config, Quality};
pub use error::ConvertError;
pub use image_processor::{CwebpEncoder, WebpEncoder};
pub use manifest::Manifest;
pub use metadata::ImageInfo;
pub use pipeline::{BatchConverter, RunReport, RunState};
