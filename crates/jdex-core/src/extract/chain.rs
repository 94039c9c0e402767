use super::{extension, CommandExtractor, ExtractionOutput, PlainTextExtractor, TextExtractor};
use crate::{JdexError, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered list of extractors; the first to produce non-blank text wins.
#[derive(Clone)]
pub struct ExtractorChain {
    extractors: Vec<Arc<dyn TextExtractor>>,
}

impl std::fmt::Debug for ExtractorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.extractors.iter().map(|e| e.name()).collect();
        f.debug_struct("ExtractorChain").field("extractors", &names).finish()
    }
}

impl Default for ExtractorChain {
    /// Plain text, then `pdftotext`, then `tesseract`.
    fn default() -> Self {
        Self::new(vec![
            Arc::new(PlainTextExtractor),
            Arc::new(CommandExtractor::pdftotext()),
            Arc::new(CommandExtractor::tesseract()),
        ])
    }
}

impl ExtractorChain {
    pub fn new(extractors: Vec<Arc<dyn TextExtractor>>) -> Self {
        Self { extractors }
    }

    /// Append a fallback extractor.
    pub fn with(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Text of `path` from the first extractor that yields any.
    ///
    /// Fails with [`JdexError::Extraction`] when no extractor supports the
    /// format or every one failed or produced blank text.
    pub async fn extract(&self, path: &Path) -> Result<ExtractionOutput> {
        let mut errors = Vec::new();

        for extractor in self.extractors.iter().filter(|e| e.supports(path)) {
            debug!("Extracting {} with {}", path.display(), extractor.name());
            let output = extractor.extract(path).await;
            if output.has_text() {
                return Ok(output);
            }

            let reason = match &output.error {
                Some(error) => error.clone(),
                None => "no text found".to_string(),
            };
            warn!("{} failed on {}: {}", extractor.name(), path.display(), reason);
            errors.push(format!("{}: {}", extractor.name(), reason));
        }

        let message = if errors.is_empty() {
            format!("No extractor supports '.{}' files", extension(path))
        } else {
            errors.join("; ")
        };
        Err(JdexError::Extraction {
            path: path.to_path_buf(),
            message,
        })
    }
}
