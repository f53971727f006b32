use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ArogyaError, Result};
use crate::types::Language;

/// Top-level configuration for the Arogya application.
///
/// Loaded from `~/.arogya/config.toml` by default. Every section is optional
/// in the file; missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArogyaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
}

impl ArogyaConfig {
    /// Parse and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ArogyaConfig = toml::from_str(&content)?;
        config.validate()?;
        info!(path = %path.display(), "Config file read");
        Ok(config)
    }

    /// Like [`ArogyaConfig::load`], but a missing file silently yields the
    /// defaults and an unreadable or invalid one is logged and replaced by
    /// them.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
            Self::default()
        })
    }

    /// Reject values the assistant cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.assistant.max_message_length == 0 {
            return Err(ArogyaError::Config(
                "assistant.max_message_length must be greater than zero".to_string(),
            ));
        }
        if self.assistant.channel.trim().is_empty() {
            return Err(ArogyaError::Config(
                "assistant.channel must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Write the config as pretty TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().filter(|d| !d.as_os_str().is_empty());
        if let Some(dir) = dir {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        info!(path = %path.display(), "Config file written");
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory holding the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Display language used for health tips.
    pub language: Language,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.arogya/data".to_string(),
            log_level: "info".to_string(),
            language: Language::En,
        }
    }
}

/// Health assistant (chat widget) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Whether the assistant accepts conversations at all.
    pub enabled: bool,
    /// Channel recorded on every conversation opened by this entry point.
    pub channel: String,
    /// Maximum accepted message length in characters.
    pub max_message_length: usize,
    /// Response text stored on an audit entry until the reply is known.
    pub pending_response: String,
    /// First bot entry shown once a conversation is ready.
    pub welcome_message: String,
    /// Bot entry shown when a turn could not be recorded.
    pub failure_notice: String,
    /// Optional TOML file replacing the built-in keyword rules.
    pub rules_path: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: "web".to_string(),
            max_message_length: 2000,
            pending_response: "Processing...".to_string(),
            welcome_message: "Hello! I'm your health assistant. How can I help you today?"
                .to_string(),
            failure_notice: "Failed to send message".to_string(),
            rules_path: None,
        }
    }
}

/// Row limits for the read-only list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub health_tips_limit: u32,
    pub outbreak_alerts_limit: u32,
    pub notifications_limit: u32,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            health_tips_limit: 6,
            outbreak_alerts_limit: 10,
            notifications_limit: 20,
        }
    }
}
