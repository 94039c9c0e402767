//! Prompt construction shared by the model-backed backends.

use crate::config::ClassifierConfig;
use crate::taxonomy::{is_excluded_area, Taxonomy};
use std::collections::BTreeMap;

/// Cut `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the categorization prompt for `text`.
///
/// The listing omits the system and archive areas so a model cannot file a
/// document into the inbox.
pub fn build_prompt(text: &str, taxonomy: &Taxonomy) -> String {
    let text = truncate_chars(text, ClassifierConfig::MAX_PROMPT_CHARS);

    let structure: BTreeMap<&str, Vec<&str>> = taxonomy
        .areas()
        .iter()
        .filter(|(name, _)| !is_excluded_area(name))
        .map(|(name, area)| {
            (
                name.as_str(),
                area.categories.keys().map(String::as_str).collect(),
            )
        })
        .collect();
    let listing = serde_json::to_string_pretty(&structure).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are a document categorization assistant using the Johnny.Decimal system.

Available Johnny.Decimal areas and categories:
{listing}

Analyze this document and categorize it.

Document content:
---
{text}
---

IMPORTANT naming rules:
- "document_type" should describe WHAT the document is (e.g., "Blood Test Results", "Employment Contract", "Insurance Card")
- "issuer" should be the organization/entity that CREATED or ISSUED the document (e.g., "City Hospital", "TK Insurance", "AutoScout24")
- Do NOT use the document subject's personal name as issuer (e.g., if it's a medical report FOR "John Smith", the issuer is the hospital, not John Smith)
- "subject_person" should ONLY be filled if the document is about someone OTHER than the system owner (e.g., spouse's documents)

Respond with ONLY valid JSON in this exact format:
{{
    "jd_area": "one of the areas like 10-19 Finance",
    "jd_category": "one of the categories like 14 Receipts",
    "document_type": "specific type like Blood Test Results or Employment Contract",
    "issuer": "organization that created/issued the document",
    "subject_person": "only if document is about someone other than system owner, otherwise null",
    "tags": ["tag1", "tag2", "tag3"],
    "confidence": "high/medium/low",
    "summary": "One sentence summary of the document",
    "date_mentioned": "YYYY-MM-DD if a date is found, null otherwise",
    "entities": ["organization names", "relevant identifiers"]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::templates;

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_prompt_truncates_document() {
        let text = "x".repeat(ClassifierConfig::MAX_PROMPT_CHARS + 500);
        let prompt = build_prompt(&text, &templates::default_taxonomy());
        assert!(prompt.contains(&"x".repeat(ClassifierConfig::MAX_PROMPT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(ClassifierConfig::MAX_PROMPT_CHARS + 1)));
    }

    #[test]
    fn test_prompt_hides_system_area() {
        let prompt = build_prompt("invoice", &templates::default_taxonomy());
        assert!(prompt.contains("14 Receipts"));
        assert!(!prompt.contains("01 Inbox"));
        assert!(prompt.contains("\"jd_category\""));
    }
}
