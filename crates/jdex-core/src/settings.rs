//! User settings and resolved runtime configuration.
//!
//! Values are resolved with the precedence
//! explicit argument > persisted setting > environment > built-in default.
//! API keys are never written to `settings.json`.

use crate::classify::BackendKind;
use crate::config::{AppConfig, ClassifierConfig, IngestConfig, NetworkConfig, PathsConfig};
use crate::metadata::{atomic_read_json, atomic_write_json};
use crate::{JdexError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// The persisted user settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbox_dir: Option<PathBuf>,
    /// `auto` or a backend name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,
}

impl Settings {
    /// `<platform config dir>/jdex/settings.json`.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| JdexError::Config {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(base
            .join(AppConfig::CONFIG_DIR_NAME)
            .join(AppConfig::SETTINGS_FILENAME))
    }

    /// Load settings, returning defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = atomic_read_json(path)?.unwrap_or_default();
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        atomic_write_json(path, self, false)
    }
}

/// Explicit values supplied by the caller (CLI flags, API arguments).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub library_dir: Option<PathBuf>,
    pub inbox_dir: Option<PathBuf>,
    pub provider: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub ollama_url: Option<String>,
    pub ollama_model: Option<String>,
    pub claude_command: Option<String>,
    pub poll_interval: Option<Duration>,
}

/// Fully resolved configuration passed into the pipeline, organizer, and loop.
#[derive(Debug, Clone)]
pub struct JdexConfig {
    pub library_dir: PathBuf,
    pub inbox_dir: PathBuf,
    /// `None` means autodetect.
    pub backend: Option<BackendKind>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub claude_command: String,
    pub poll_interval: Duration,
}

impl JdexConfig {
    /// Resolve configuration from explicit overrides, persisted settings and
    /// an injected environment lookup.
    pub fn resolve<F>(overrides: &ConfigOverrides, settings: &Settings, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank environment values count as unset.
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let library_dir = overrides
            .library_dir
            .clone()
            .or_else(|| settings.library_dir.clone())
            .or_else(|| env("OUTPUT_DIR").map(PathBuf::from))
            .unwrap_or_else(default_library_dir);

        let inbox_dir = overrides
            .inbox_dir
            .clone()
            .or_else(|| settings.inbox_dir.clone())
            .or_else(|| env("INBOX_DIR").map(PathBuf::from))
            .unwrap_or_else(|| default_inbox_dir(&library_dir));

        let provider = overrides
            .provider
            .clone()
            .or_else(|| settings.provider.clone())
            .or_else(|| env("AI_PROVIDER"));
        let backend = match provider {
            Some(name) => BackendKind::parse_preference(&name)?,
            None => None,
        };

        let pick = |explicit: &Option<String>, persisted: &Option<String>, var: &str, default: &str| {
            explicit
                .clone()
                .or_else(|| persisted.clone())
                .or_else(|| env(var))
                .unwrap_or_else(|| default.to_string())
        };

        let poll_interval = overrides
            .poll_interval
            .or_else(|| settings.poll_interval_secs.map(Duration::from_secs))
            .unwrap_or(IngestConfig::DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(JdexError::Config {
                message: "poll interval must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            anthropic_api_key: overrides
                .anthropic_api_key
                .clone()
                .or_else(|| env("ANTHROPIC_API_KEY")),
            anthropic_model: pick(
                &overrides.anthropic_model,
                &settings.anthropic_model,
                "ANTHROPIC_MODEL",
                ClassifierConfig::DEFAULT_ANTHROPIC_MODEL,
            ),
            openai_api_key: overrides
                .openai_api_key
                .clone()
                .or_else(|| env("OPENAI_API_KEY")),
            openai_model: pick(
                &overrides.openai_model,
                &settings.openai_model,
                "OPENAI_MODEL",
                ClassifierConfig::DEFAULT_OPENAI_MODEL,
            ),
            ollama_url: pick(
                &overrides.ollama_url,
                &settings.ollama_url,
                "OLLAMA_URL",
                NetworkConfig::OLLAMA_DEFAULT_URL,
            ),
            ollama_model: pick(
                &overrides.ollama_model,
                &settings.ollama_model,
                "OLLAMA_MODEL",
                ClassifierConfig::DEFAULT_OLLAMA_MODEL,
            ),
            claude_command: pick(
                &overrides.claude_command,
                &settings.claude_command,
                "JDEX_CLAUDE_COMMAND",
                ClassifierConfig::DEFAULT_CLAUDE_COMMAND,
            ),
            library_dir,
            inbox_dir,
            backend,
            poll_interval,
        })
    }

    /// Resolve against the real process environment.
    pub fn from_env(overrides: &ConfigOverrides, settings: &Settings) -> Result<Self> {
        Self::resolve(overrides, settings, |key| std::env::var(key).ok())
    }
}

fn default_library_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(AppConfig::DEFAULT_LIBRARY_DIR_NAME)
}

/// `<library>/00-09 System/01 Inbox`.
pub fn default_inbox_dir(library_dir: &Path) -> PathBuf {
    library_dir
        .join(PathsConfig::SYSTEM_AREA_DIR)
        .join(PathsConfig::INBOX_DIR)
}
