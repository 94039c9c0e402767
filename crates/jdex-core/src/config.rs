//! Centralized configuration constants for jdex.
//!
//! User-adjustable values live in [`crate::settings`]; this module only holds
//! the built-in defaults and fixed names.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const CONFIG_DIR_NAME: &'static str = "jdex";
    pub const SETTINGS_FILENAME: &'static str = "settings.json";
    pub const DEFAULT_LIBRARY_DIR_NAME: &'static str = "jd_documents";
}

/// Categorization pipeline limits and defaults.
pub struct ClassifierConfig;

impl ClassifierConfig {
    /// Character budget for document text sent to a backend. Not token-aware.
    pub const MAX_PROMPT_CHARS: usize = 8000;
    pub const MAX_RESPONSE_TOKENS: u32 = 500;
    pub const MAX_KEYWORD_TAGS: usize = 10;
    /// Areas never offered to a backend and never chosen by keyword scoring.
    pub const EXCLUDED_AREAS: &'static [&'static str] = &["00-09 System", "90-99 Archive"];
    /// Placement used when a taxonomy has no eligible category at all.
    pub const FALLBACK_AREA: &'static str = "00-09 System";
    pub const FALLBACK_CATEGORY: &'static str = "09 Uncategorized";
    pub const DEFAULT_ANTHROPIC_MODEL: &'static str = "claude-sonnet-4-20250514";
    pub const DEFAULT_OPENAI_MODEL: &'static str = "gpt-4o";
    pub const DEFAULT_OLLAMA_MODEL: &'static str = "llama3.2";
    pub const DEFAULT_CLAUDE_COMMAND: &'static str = "claude";
}

/// Network and subprocess timeouts for categorization backends.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const CLI_TIMEOUT: Duration = Duration::from_secs(60);
    pub const CLI_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
    pub const API_TIMEOUT: Duration = Duration::from_secs(60);
    pub const LOCAL_MODEL_TIMEOUT: Duration = Duration::from_secs(120);
    pub const LOCAL_MODEL_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
    pub const ANTHROPIC_API_BASE: &'static str = "https://api.anthropic.com";
    pub const ANTHROPIC_API_VERSION: &'static str = "2023-06-01";
    pub const OPENAI_API_BASE: &'static str = "https://api.openai.com";
    pub const OLLAMA_DEFAULT_URL: &'static str = "http://localhost:11434";
    pub const OLLAMA_ALLOWED_HOSTS: &'static [&'static str] = &["localhost", "127.0.0.1", "::1"];
    pub const USER_AGENT: &'static str = "jdex";
}

/// Ingest loop configuration.
pub struct IngestConfig;

impl IngestConfig {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
    pub const EXTRACTOR_TIMEOUT: Duration = Duration::from_secs(120);
    pub const FAILED_DIR_NAME: &'static str = "_failed";
    /// Inbox extensions the loop picks up (lowercase, without dot).
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] = &[
        "pdf", "png", "jpg", "jpeg", "tiff", "bmp", "docx", "pptx", "xlsx", "txt", "html",
    ];
}

/// Persisted document names, relative to the library root.
pub struct PathsConfig;

impl PathsConfig {
    pub const JDEX_FILENAME: &'static str = "jdex.json";
    pub const LEGACY_JDEX_PATH: &'static str = "00-09 System/00 Index/jdex.json";
    pub const ID_STATE_FILENAME: &'static str = ".jd_ids.json";
    pub const HASH_INDEX_FILENAME: &'static str = ".hash_index.json";
    pub const LEDGER_FILENAME: &'static str = ".processed_files.json";
    pub const SEARCH_INDEX_FILENAME: &'static str = ".search_index.json";
    pub const META_SIDECAR_SUFFIX: &'static str = ".meta.json";
    pub const ANALYSIS_SIDECAR_SUFFIX: &'static str = ".analysis.json";
    pub const SYSTEM_AREA_DIR: &'static str = "00-09 System";
    pub const INBOX_DIR: &'static str = "01 Inbox";
}

/// True if `ext` (with or without a leading dot, any case) is an inbox format.
pub fn is_supported_extension(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.').to_lowercase();
    IngestConfig::SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}

/// True if a file name is one of the per-document sidecars.
pub fn is_sidecar_name(name: &str) -> bool {
    name.ends_with(PathsConfig::META_SIDECAR_SUFFIX)
        || name.ends_with(PathsConfig::ANALYSIS_SIDECAR_SUFFIX)
}
