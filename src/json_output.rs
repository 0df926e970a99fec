//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso programmatico.
//!
//! ## Responsabilità:
//! - Emette messaggi JSON (uno per riga) su stdout per gli eventi del run
//! - Fornisce interfaccia standardizzata per comunicazione inter-processo
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del run (root, file trovati, configurazione)
//! - `file_complete`: Fine conversione di un file (artifact o errore)
//! - `manifest`: Manifest scritto
//! - `complete`: Fine run con le statistiche finali
//! - `error`: Errore fatale

use crate::config::Config;
use crate::progress::RunStats;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del run
    Start {
        input_dir: PathBuf,
        output_dir: PathBuf,
        total_files: usize,
        config: JsonConfig,
    },

    /// Fine conversione di un file
    FileComplete {
        source: PathBuf,
        output: Option<PathBuf>,
        variant: bool,
        error: Option<String>,
    },

    /// Manifest scritto
    Manifest { path: PathBuf, entries: usize },

    /// Run completato
    Complete {
        state: String,
        stats: RunStats,
        duration_seconds: f64,
    },

    /// Errore fatale
    Error { message: String },
}

/// Configurazione per output JSON
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonConfig {
    pub quality: u8,
    pub workers: usize,
    pub honor_variants: bool,
    pub include_hidden: bool,
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(config: &Config, total_files: usize) -> Self {
        Self::Start {
            input_dir: config.input_dir.clone(),
            output_dir: config.output_dir.clone(),
            total_files,
            config: JsonConfig::from(config),
        }
    }

    pub fn file_complete(source: PathBuf, output: Option<PathBuf>, variant: bool, error: Option<String>) -> Self {
        Self::FileComplete {
            source,
            output,
            variant,
            error,
        }
    }

    pub fn complete(state: impl ToString, stats: RunStats, duration_seconds: f64) -> Self {
        Self::Complete {
            state: state.to_string(),
            stats,
            duration_seconds,
        }
    }

    pub fn error(message: impl ToString) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            quality: config.quality,
            workers: config.workers,
            honor_variants: config.honor_variants,
            include_hidden: config.include_hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_tags() {
        let json = serde_json::to_value(JsonMessage::Manifest {
            path: PathBuf::from("/out/info.json"),
            entries: 3,
        })
        .unwrap();
        assert_eq!(json["type"], "manifest");
        assert_eq!(json["entries"], 3);

        let json = serde_json::to_value(JsonMessage::file_complete(
            PathBuf::from("/in/b.jpg"),
            None,
            false,
            Some("cwebp exited with 1".to_string()),
        ))
        .unwrap();
        assert_eq!(json["type"], "file_complete");
        assert!(json["output"].is_null());
    }

    #[test]
    fn test_start_carries_config() {
        let config = Config::default();
        match JsonMessage::start(&config, 12) {
            JsonMessage::Start { total_files, config: json, .. } => {
                assert_eq!(total_files, 12);
                assert_eq!(json.quality, 90);
                assert!(json.honor_variants);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
