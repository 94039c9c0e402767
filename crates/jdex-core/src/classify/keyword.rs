//! Deterministic keyword scoring. Always available, never fails.

use super::backend::{BackendKind, CategorizationBackend};
use super::types::{ClassificationResult, Confidence};
use crate::config::ClassifierConfig;
use crate::taxonomy::{CategoryRef, Taxonomy};
use crate::Result;
use async_trait::async_trait;

/// Scores every eligible category by how many of its keywords occur in the
/// lower-cased text.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordBackend;

impl KeywordBackend {
    pub fn new() -> Self {
        Self
    }

    /// Infallible classification.
    ///
    /// The category with the strictly highest score wins; ties go to the
    /// category enumerated first. With no match at all the first eligible
    /// category is returned, and with no eligible category the built-in
    /// uncategorized placement.
    pub fn classify_text(&self, text: &str, taxonomy: &Taxonomy) -> ClassificationResult {
        let haystack = text.to_lowercase();

        let mut best: Option<(CategoryRef<'_>, Vec<String>)> = None;
        let mut best_score = 0usize;
        for candidate in taxonomy.eligible_categories() {
            let matched = matched_keywords(&candidate.definition.keywords, &haystack);
            if matched.len() > best_score {
                best_score = matched.len();
                best = Some((candidate, matched));
            }
        }

        if let Some((winner, matched)) = best {
            let mut result = ClassificationResult::placement(
                winner.area,
                winner.category,
                "Categorized by keyword matching",
            );
            result.confidence = if best_score >= 2 {
                Confidence::Medium
            } else {
                Confidence::Low
            };
            result.tags = matched
                .into_iter()
                .take(ClassifierConfig::MAX_KEYWORD_TAGS)
                .collect();
            return result;
        }

        match taxonomy.eligible_categories().next() {
            Some(first) => {
                ClassificationResult::placement(first.area, first.category, "Default categorization")
            }
            None => ClassificationResult::placement(
                ClassifierConfig::FALLBACK_AREA,
                ClassifierConfig::FALLBACK_CATEGORY,
                "Default categorization",
            ),
        }
    }
}

/// Distinct keywords (lower-cased) that occur in `haystack`. Blank keywords
/// never match.
fn matched_keywords(keywords: &[String], haystack: &str) -> Vec<String> {
    let mut matched: Vec<String> = Vec::new();
    for keyword in keywords {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() && haystack.contains(&keyword) && !matched.contains(&keyword) {
            matched.push(keyword);
        }
    }
    matched
}

#[async_trait]
impl CategorizationBackend for KeywordBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Keywords
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn classify(&self, text: &str, taxonomy: &Taxonomy) -> Result<ClassificationResult> {
        Ok(self.classify_text(text, taxonomy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::templates;

    fn finance() -> Taxonomy {
        Taxonomy::new()
            .with_area("00-09 System", "", &[("01 Inbox", &["receipt", "purchase", "order"])])
            .with_area(
                "10-19 Finance",
                "",
                &[
                    ("11 Banking", &["bank", "statement"]),
                    ("14 Receipts", &["receipt", "purchase"]),
                ],
            )
            .with_area("90-99 Archive", "", &[("91 Old", &["receipt", "purchase", "order"])])
    }

    #[test]
    fn test_highest_score_wins() {
        let result = KeywordBackend.classify_text("Purchase RECEIPT for a laptop", &finance());
        assert_eq!(result.jd_area, "10-19 Finance");
        assert_eq!(result.jd_category, "14 Receipts");
        assert_eq!(result.confidence, Confidence::Medium);
        assert_eq!(result.tags, vec!["receipt", "purchase"]);
        assert_eq!(result.document_type, "Document");
        assert_eq!(result.issuer, "Unknown");
    }

    #[test]
    fn test_single_match_is_low_confidence() {
        let result = KeywordBackend.classify_text("your bank", &finance());
        assert_eq!(result.jd_category, "11 Banking");
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_tie_goes_to_first_enumerated() {
        // One hit each for Banking and Receipts.
        let result = KeywordBackend.classify_text("bank receipt", &finance());
        assert_eq!(result.jd_category, "11 Banking");
    }

    #[test]
    fn test_system_and_archive_never_chosen() {
        let result = KeywordBackend.classify_text("order order order", &finance());
        assert_eq!(result.jd_area, "10-19 Finance");
        assert_eq!(result.jd_category, "11 Banking");
        assert_eq!(result.summary, "Default categorization");
    }

    #[test]
    fn test_empty_text_returns_valid_pair() {
        let tax = templates::default_taxonomy();
        let result = KeywordBackend.classify_text("", &tax);
        assert!(tax.contains(&result.jd_area, &result.jd_category));
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_empty_taxonomy_uses_builtin_placement() {
        let result = KeywordBackend.classify_text("anything", &Taxonomy::new());
        assert_eq!(result.jd_area, "00-09 System");
        assert_eq!(result.jd_category, "09 Uncategorized");
    }

    #[test]
    fn test_blank_keywords_ignored() {
        let tax = Taxonomy::new()
            .with_area("10-19 Finance", "", &[("11 Banking", &[""]), ("12 Taxes", &["tax"])]);
        let result = KeywordBackend.classify_text("tax return", &tax);
        assert_eq!(result.jd_category, "12 Taxes");
    }
}
