//! Text extraction from raw documents.
//!
//! Extraction itself is delegated: plain-text formats are read directly, PDFs
//! and images go through external tools (`pdftotext`, `tesseract`). An
//! [`ExtractorChain`] tries extractors in order until one yields text.

mod chain;
mod command;
mod plain;

pub use chain::ExtractorChain;
pub use command::CommandExtractor;
pub use plain::PlainTextExtractor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Result of one extraction attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub success: bool,
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionOutput {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Succeeded with non-blank text.
    pub fn has_text(&self) -> bool {
        self.success && !self.text.trim().is_empty()
    }
}

/// Something that turns a document into text.
///
/// Failures are reported in the output rather than as errors so a chain can
/// collect them and move on.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    /// True if this extractor handles the file's format.
    fn supports(&self, path: &Path) -> bool;

    async fn extract(&self, path: &Path) -> ExtractionOutput;
}

/// Lower-cased extension without the dot.
pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
