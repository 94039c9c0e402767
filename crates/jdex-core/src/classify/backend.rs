//! The categorization backend capability.
//!
//! Every backend owns its availability probe and maps its own failures into
//! [`JdexError`]. The pipeline only looks at success or failure.

use super::decode::decode_classification;
use super::types::ClassificationResult;
use crate::config::NetworkConfig;
use crate::taxonomy::Taxonomy;
use crate::{JdexError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Identity of a backend implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Subscription CLI (`claude --print`).
    #[serde(rename = "claude-code")]
    ClaudeCode,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    /// Local model server.
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "keywords")]
    Keywords,
}

impl BackendKind {
    /// Probe order used when no backend is configured. Keywords always come last.
    pub const AUTODETECT_ORDER: [BackendKind; 4] = [
        BackendKind::ClaudeCode,
        BackendKind::Anthropic,
        BackendKind::OpenAi,
        BackendKind::Ollama,
    ];

    pub const ALL: [BackendKind; 5] = [
        BackendKind::ClaudeCode,
        BackendKind::Anthropic,
        BackendKind::OpenAi,
        BackendKind::Ollama,
        BackendKind::Keywords,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::ClaudeCode => "claude-code",
            BackendKind::Anthropic => "anthropic",
            BackendKind::OpenAi => "openai",
            BackendKind::Ollama => "ollama",
            BackendKind::Keywords => "keywords",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::ClaudeCode => "Claude Code CLI",
            BackendKind::Anthropic => "Anthropic Claude",
            BackendKind::OpenAi => "OpenAI GPT",
            BackendKind::Ollama => "Ollama (Local)",
            BackendKind::Keywords => "Keyword Matching (No AI)",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, BackendKind::Anthropic | BackendKind::OpenAi)
    }

    /// Parse a provider preference. `auto` (or blank) means autodetect.
    pub fn parse_preference(value: &str) -> Result<Option<Self>> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("auto") {
            return Ok(None);
        }
        value.parse().map(Some)
    }
}

impl FromStr for BackendKind {
    type Err = JdexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "claude-code" | "claude_code" | "claude-cli" | "claude" => Ok(BackendKind::ClaudeCode),
            "anthropic" => Ok(BackendKind::Anthropic),
            "openai" => Ok(BackendKind::OpenAi),
            "ollama" | "local" => Ok(BackendKind::Ollama),
            "keywords" | "keyword" => Ok(BackendKind::Keywords),
            _ => {
                let available: Vec<_> = BackendKind::ALL.iter().map(|k| k.name()).collect();
                Err(JdexError::Config {
                    message: format!(
                        "Unknown provider '{}'. Available: auto, {}",
                        s,
                        available.join(", ")
                    ),
                })
            }
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pluggable categorization capability.
#[async_trait]
pub trait CategorizationBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Cheap readiness probe (credentials present, service reachable).
    async fn is_available(&self) -> bool;

    /// Classify document text against a taxonomy.
    ///
    /// The returned placement is not yet reconciled against the taxonomy.
    async fn classify(&self, text: &str, taxonomy: &Taxonomy) -> Result<ClassificationResult>;
}

/// Availability report for one backend.
#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub name: &'static str,
    pub display_name: &'static str,
    pub requires_api_key: bool,
    pub available: bool,
}

/// Build a reqwest client with a total request timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(NetworkConfig::USER_AGENT)
        .build()
        .map_err(|e| JdexError::Config {
            message: format!("Failed to build HTTP client: {}", e),
        })
}

/// Map a transport error, keeping the configured timeout on timeouts.
pub(crate) fn request_err(kind: BackendKind, err: reqwest::Error, timeout: Duration) -> JdexError {
    if err.is_timeout() {
        JdexError::Timeout(timeout)
    } else {
        JdexError::backend(kind.name(), format!("Request failed: {}", err))
    }
}

/// Decode a raw model reply into a classification.
pub(crate) fn decode_reply(kind: BackendKind, raw: &str) -> Result<ClassificationResult> {
    decode_classification(raw).map_err(|message| JdexError::backend(kind.name(), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("claude-code".parse::<BackendKind>().unwrap(), BackendKind::ClaudeCode);
        assert_eq!("OpenAI".parse::<BackendKind>().unwrap(), BackendKind::OpenAi);
        assert_eq!("keyword".parse::<BackendKind>().unwrap(), BackendKind::Keywords);
        assert!("bedrock".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_parse_preference() {
        assert_eq!(BackendKind::parse_preference("auto").unwrap(), None);
        assert_eq!(BackendKind::parse_preference("").unwrap(), None);
        assert_eq!(
            BackendKind::parse_preference("ollama").unwrap(),
            Some(BackendKind::Ollama)
        );
    }

    #[test]
    fn test_names_round_trip_through_display() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
        assert_eq!(
            serde_json::to_value(BackendKind::OpenAi).unwrap(),
            serde_json::json!("openai")
        );
    }

    #[test]
    fn test_api_key_requirements() {
        assert!(BackendKind::Anthropic.requires_api_key());
        assert!(!BackendKind::Ollama.requires_api_key());
        assert!(!BackendKind::Keywords.requires_api_key());
    }
}
