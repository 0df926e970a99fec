//! # WebP Batch Converter - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Costruzione della configurazione (file JSON opzionale + override da CLI)
//! - Gestione di Ctrl-C come richiesta di stop
//! - Avvio del `BatchConverter`
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (directory, quality, workers, naming, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose, `RUST_LOG` se presente)
//! 3. Carica la configurazione da `--config` e applica gli override
//! 4. Salva la configurazione se richiesto con `--save-config`
//! 5. Avvia il run; exit status non-zero solo se il run fallisce
//!
//! ## Esempio di utilizzo:
//! ```bash
//! webp-batch ./assets ./public/img --quality 85 --workers 8 --dir-naming kebab-case
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use webp_batch::naming::DirectoryNaming;
use webp_batch::platform::PlatformCommands;
use webp_batch::rename::CollisionMode;
use webp_batch::{BatchConverter, Config};

#[derive(Parser)]
#[command(name = "webp-batch")]
#[command(about = "Convert an image tree to WebP with 2x variant naming and a dimensions manifest")]
struct Args {
    /// Directory containing the source images
    input_dir: Option<PathBuf>,

    /// Directory receiving the WebP files and the manifest
    output_dir: Option<PathBuf>,

    /// WebP quality (0-100) [default: 90]
    #[arg(short, long)]
    quality: Option<u8>,

    /// Number of parallel workers [default: 4]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Do not apply the 2x naming convention; every image goes in the manifest
    #[arg(long)]
    no_variants: bool,

    /// Include hidden files and directories
    #[arg(long)]
    include_hidden: bool,

    /// Rewrite rule for nested directory names [default: identity]
    #[arg(long, value_enum)]
    dir_naming: Option<DirectoryNaming>,

    /// What to do when two outputs get the same final name [default: overwrite]
    #[arg(long, value_enum)]
    collision: Option<CollisionMode>,

    /// File name of the manifest written in the output directory [default: info.json]
    #[arg(long)]
    manifest_name: Option<String>,

    /// cwebp compression method (0 = fast, 6 = slowest) [default: 6]
    #[arg(long)]
    method: Option<u8>,

    /// Path to the cwebp binary (looked up on PATH otherwise)
    #[arg(long)]
    cwebp: Option<PathBuf>,

    /// Load configuration from a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the effective configuration to a JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Output progress as JSON lines for programmatic use
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Applica gli override della CLI sopra la configurazione caricata
    fn apply_to(self, mut config: Config) -> Result<Config> {
        if let Some(input_dir) = self.input_dir {
            config.input_dir = input_dir;
        } else if self.config.is_none() {
            anyhow::bail!("Missing input directory");
        }

        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        } else if self.config.is_none() {
            anyhow::bail!("Missing output directory");
        }

        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.no_variants {
            config.honor_variants = false;
        }
        if self.include_hidden {
            config.include_hidden = true;
        }
        if let Some(naming) = self.dir_naming {
            config.directory_naming = naming;
        }
        if let Some(mode) = self.collision {
            config.collision_mode = mode;
        }
        if let Some(name) = self.manifest_name {
            config.manifest_name = name;
        }
        if let Some(method) = self.method {
            config.encoder_method = method;
        }
        if self.cwebp.is_some() {
            config.cwebp_path = self.cwebp;
        }
        if self.json {
            config.json_output = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging on stderr, stdout is reserved for JSON events
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    debug!("Running on {}", PlatformCommands::system_info());

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let save_path = args.save_config.clone();
    let config = args.apply_to(config)?;

    if let Some(path) = save_path {
        config
            .save_to_file(&path)
            .await
            .with_context(|| format!("Failed to save config to {}", path.display()))?;
        info!("Configuration saved to {}", path.display());
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Stop requested, waiting for running conversions to finish");
            let _ = stop_tx.send(true);
        }
    });

    let mut converter = BatchConverter::new(config)?.with_cancellation(stop_rx);
    let report = converter.run().await?;

    if report.stats.failures() > 0 {
        warn!("{} file(s) had problems, see the log above", report.stats.failures());
    }

    Ok(())
}
