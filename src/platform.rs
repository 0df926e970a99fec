//! # Platform-specific utilities
//!
//! Questo modulo centralizza la logica cross-platform per trovare l'encoder
//! esterno (`cwebp`): nome dell'eseguibile per piattaforma e verifica della
//! disponibilità nel PATH.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Platform-specific command manager
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
    which_command: &'static str,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let mut commands = HashMap::new();
        if cfg!(windows) {
            commands.insert("cwebp", "cwebp.exe");
            Self { commands, which_command: "where" }
        } else {
            commands.insert("cwebp", "cwebp");
            Self { commands, which_command: "which" }
        }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).copied().unwrap_or(base_name)
    }

    /// Get the command used to check if a program exists
    pub fn which_command(&self) -> &str {
        self.which_command
    }

    /// Resolve the executable to run: an explicit override wins over PATH lookup
    pub fn resolve(&self, base_name: &str, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(self.get_command(base_name)))
    }

    /// Check if an executable is available, either at an explicit path or on PATH
    pub async fn is_command_available(&self, base_name: &str, explicit: Option<&Path>) -> bool {
        if let Some(path) = explicit {
            return tokio::fs::metadata(path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
        }

        let result = tokio::process::Command::new(self.which_command)
            .arg(self.get_command(base_name))
            .output()
            .await;

        match result {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    /// Get system information for debugging
    pub fn system_info() -> SystemInfo {
        SystemInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
        }
    }
}

/// System information structure
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
}

impl std::fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.os, self.arch, self.family)
    }
}
