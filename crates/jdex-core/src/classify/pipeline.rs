//! Backend selection and fallback.
//!
//! [`CategorizationPipeline::classify`] never fails: every backend failure
//! degrades to the next candidate and finally to keyword scoring.

use super::anthropic::AnthropicBackend;
use super::backend::{BackendKind, BackendStatus, CategorizationBackend};
use super::claude_cli::ClaudeCliBackend;
use super::keyword::KeywordBackend;
use super::ollama::OllamaBackend;
use super::openai::OpenAiBackend;
use super::prompt::truncate_chars;
use super::types::ClassificationResult;
use crate::config::ClassifierConfig;
use crate::settings::JdexConfig;
use crate::taxonomy::{is_excluded_area, Taxonomy};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct CategorizationPipeline {
    /// Model-backed backends in autodetect priority order.
    backends: Vec<Arc<dyn CategorizationBackend>>,
    /// Configured backend; `None` autodetects.
    preference: Option<BackendKind>,
    keyword: KeywordBackend,
}

impl CategorizationPipeline {
    /// Build every backend from resolved configuration.
    pub fn from_config(config: &JdexConfig) -> Result<Self> {
        let backends: Vec<Arc<dyn CategorizationBackend>> = vec![
            Arc::new(ClaudeCliBackend::new(config.claude_command.clone())),
            Arc::new(AnthropicBackend::new(
                config.anthropic_api_key.clone(),
                config.anthropic_model.clone(),
            )?),
            Arc::new(OpenAiBackend::new(
                config.openai_api_key.clone(),
                config.openai_model.clone(),
            )?),
            Arc::new(OllamaBackend::new(&config.ollama_url, config.ollama_model.clone())?),
        ];
        Ok(Self::new(backends, config.backend))
    }

    /// A pipeline over explicit backends. Keyword scoring is always appended.
    pub fn new(backends: Vec<Arc<dyn CategorizationBackend>>, preference: Option<BackendKind>) -> Self {
        let mut backends = backends;
        backends.retain(|b| b.kind() != BackendKind::Keywords);
        backends.sort_by_key(|b| {
            BackendKind::AUTODETECT_ORDER
                .iter()
                .position(|k| *k == b.kind())
                .unwrap_or(usize::MAX)
        });
        Self {
            backends,
            preference,
            keyword: KeywordBackend::new(),
        }
    }

    /// Keyword scoring only.
    pub fn keywords_only() -> Self {
        Self::new(Vec::new(), Some(BackendKind::Keywords))
    }

    pub fn preference(&self) -> Option<BackendKind> {
        self.preference
    }

    /// Classify `text`. `hint` overrides the configured preference.
    ///
    /// With a chosen backend, that backend is tried and then keyword scoring.
    /// Without one, every available backend is tried in priority order before
    /// keyword scoring. Results are reconciled against the taxonomy; a
    /// placement that cannot be reconciled counts as a failure.
    pub async fn classify(
        &self,
        text: &str,
        taxonomy: &Taxonomy,
        hint: Option<BackendKind>,
    ) -> ClassificationResult {
        let text = truncate_chars(text, ClassifierConfig::MAX_PROMPT_CHARS);

        for backend in self.candidates(hint.or(self.preference)) {
            let name = backend.kind().name();
            if !backend.is_available().await {
                debug!("Backend {} unavailable, skipping", name);
                continue;
            }

            match backend.classify(text, taxonomy).await {
                Ok(raw) => match reconcile(raw, taxonomy) {
                    Some(result) => {
                        info!(
                            "Classified by {} as {} / {} ({})",
                            name, result.jd_area, result.jd_category, result.confidence
                        );
                        return result;
                    }
                    None => warn!("Backend {} chose a location outside the taxonomy", name),
                },
                Err(e) => warn!("Backend {} failed: {}", name, e),
            }
        }

        let result = self.keyword.classify_text(text, taxonomy);
        info!(
            "Classified by keywords as {} / {} ({})",
            result.jd_area, result.jd_category, result.confidence
        );
        result
    }

    fn candidates(&self, choice: Option<BackendKind>) -> Vec<&Arc<dyn CategorizationBackend>> {
        match choice {
            Some(BackendKind::Keywords) => Vec::new(),
            Some(kind) => {
                let chosen: Vec<_> = self.backends.iter().filter(|b| b.kind() == kind).collect();
                if chosen.is_empty() {
                    warn!("Backend {} is not configured; using keywords", kind);
                }
                chosen
            }
            None => self.backends.iter().collect(),
        }
    }

    /// Report every backend, keyword scoring included.
    pub async fn list_backends(&self) -> Vec<BackendStatus> {
        let mut statuses = Vec::with_capacity(self.backends.len() + 1);
        for backend in self.backends.iter() {
            let kind = backend.kind();
            statuses.push(BackendStatus {
                name: kind.name(),
                display_name: kind.display_name(),
                requires_api_key: kind.requires_api_key(),
                available: backend.is_available().await,
            });
        }
        let kind = self.keyword.kind();
        statuses.push(BackendStatus {
            name: kind.name(),
            display_name: kind.display_name(),
            requires_api_key: false,
            available: true,
        });
        statuses
    }
}

/// Fit a backend's placement to the taxonomy.
///
/// - an exact `(area, category)` pair is kept;
/// - a known category under the wrong area gets its area corrected;
/// - a category matching only by number prefix is renamed to the taxonomy's;
/// - anything else, or a placement in the system or archive area, is `None`.
pub fn reconcile(mut result: ClassificationResult, taxonomy: &Taxonomy) -> Option<ClassificationResult> {
    let area = result.jd_area.trim().to_string();
    let category = result.jd_category.trim().to_string();

    let found = taxonomy
        .categories()
        .find(|c| c.area == area && c.category == category)
        .or_else(|| taxonomy.find_category(&category))
        .or_else(|| leading_number(&category).and_then(|n| taxonomy.find_by_number(n)))?;

    if is_excluded_area(found.area) {
        return None;
    }
    if found.area != result.jd_area || found.category != result.jd_category {
        debug!(
            "Reconciled {} / {} to {} / {}",
            result.jd_area, result.jd_category, found.area, found.category
        );
    }
    result.jd_area = found.area.to_string();
    result.jd_category = found.category.to_string();
    Some(result)
}

/// `"14"`, `"14 Receipt"`, `"14. Receipts"` -> `14`.
fn leading_number(name: &str) -> Option<u8> {
    let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() == 2 {
        digits.parse().ok()
    } else {
        None
    }
}
