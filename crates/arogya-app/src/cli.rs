//! CLI argument definitions for the Arogya application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use arogya_core::types::Language;

/// Arogya: a multilingual health assistant with symptom guidance,
/// vaccination schedules, outbreak alerts and hospital listings.
#[derive(Parser, Debug)]
#[command(name = "arogya", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the SQLite database.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive assistant session.
    Chat {
        #[arg(short, long)]
        user: String,
    },
    /// Print the assistant's reply to a single query without saving it.
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Latest health tips.
    Tips {
        /// Language code (en, hi, mr, ta, bn, ml).
        #[arg(long)]
        language: Option<String>,
    },
    /// A user's vaccination schedule.
    Vaccinations {
        #[arg(short, long)]
        user: String,
    },
    /// Recent outbreak alerts.
    Alerts,
    /// Hospitals with availability and directions.
    Hospitals,
    /// A user's notifications.
    Notifications {
        #[arg(short, long)]
        user: String,
    },
    /// Print a stored conversation transcript.
    History {
        #[arg(long)]
        conversation: Uuid,
    },
    /// Print a user's query audit log.
    Audit {
        #[arg(short, long)]
        user: String,
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// Load feed rows (tips, vaccinations, alerts, hospitals, notifications)
    /// from a JSON file.
    Import { path: PathBuf },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > AROGYA_CONFIG env var > ~/.arogya/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("AROGYA_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory path.
    ///
    /// Returns `None` if not overridden (use config value).
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log filter.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            if !filter.trim().is_empty() {
                return filter;
            }
        }
        config_level.to_string()
    }
}

/// Resolve the language for the tips view.
///
/// Priority: --language flag > config file value.
pub fn resolve_language(
    flag: Option<&str>,
    config_language: Language,
) -> Result<Language, arogya_core::ArogyaError> {
    match flag {
        Some(code) => code.parse(),
        None => Ok(config_language),
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".arogya").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".arogya").join("config.toml");
    }
    PathBuf::from("config.toml")
}
