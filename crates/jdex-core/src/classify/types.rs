//! Classification result types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How sure a backend is about its placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

impl Confidence {
    /// Lenient parse of a backend-supplied label. Unknown labels are `Low`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" | "med" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one categorization attempt.
///
/// Field names match the JSON object backends are asked to produce and the
/// sidecar format read by review tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationResult {
    pub jd_area: String,
    pub jd_category: String,
    pub document_type: String,
    pub issuer: String,
    pub subject_person: Option<String>,
    pub tags: Vec<String>,
    pub confidence: Confidence,
    pub summary: String,
    pub date_mentioned: Option<String>,
    pub entities: Vec<String>,
}

impl ClassificationResult {
    /// A low-confidence placement with placeholder descriptive fields.
    pub fn placement(area: &str, category: &str, summary: &str) -> Self {
        Self {
            jd_area: area.to_string(),
            jd_category: category.to_string(),
            document_type: "Document".to_string(),
            issuer: "Unknown".to_string(),
            summary: summary.to_string(),
            ..Default::default()
        }
    }
}
