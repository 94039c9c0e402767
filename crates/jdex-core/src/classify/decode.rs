//! Best-effort decoding of free-form model replies.
//!
//! Replies may be fenced in markdown, surrounded by prose, or use slightly
//! different field names. The decoder finds the first balanced `{...}` object
//! that parses as JSON and reads fields leniently from it.

use super::types::{ClassificationResult, Confidence};
use serde_json::{Map, Value};

/// Find the first balanced, JSON-parseable object in `raw`.
///
/// Text inside a markdown code fence is searched before the rest of the reply.
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    if let Some(fenced) = fenced_block(raw) {
        if let Some(obj) = first_object(fenced) {
            return Some(obj);
        }
    }
    first_object(raw)
}

/// Decode a model reply into a classification. The error is a human-readable
/// reason suitable for a backend failure message.
pub fn decode_classification(raw: &str) -> std::result::Result<ClassificationResult, String> {
    let obj = extract_json_object(raw).ok_or_else(|| {
        format!(
            "No JSON object in response: {}",
            crate::classify::prompt::truncate_chars(raw.trim(), 120)
        )
    })?;

    let jd_category = string_field(&obj, &["jd_category", "category"]).unwrap_or_default();
    if jd_category.is_empty() {
        return Err("Response has no category".to_string());
    }

    Ok(ClassificationResult {
        jd_area: string_field(&obj, &["jd_area", "area"]).unwrap_or_default(),
        jd_category,
        document_type: string_field(&obj, &["document_type", "type"]).unwrap_or_default(),
        issuer: string_field(&obj, &["issuer"]).unwrap_or_default(),
        subject_person: string_field(&obj, &["subject_person"]),
        tags: list_field(&obj, "tags"),
        confidence: string_field(&obj, &["confidence"])
            .map(|c| Confidence::from_label(&c))
            .unwrap_or_default(),
        summary: string_field(&obj, &["summary"]).unwrap_or_default(),
        date_mentioned: string_field(&obj, &["date_mentioned", "date"]),
        entities: list_field(&obj, "entities"),
    })
}

/// Contents of the first ``` fence, without its language tag line.
fn fenced_block(raw: &str) -> Option<&str> {
    let start = raw.find("```")? + 3;
    let rest = &raw[start..];
    // Skip an info string such as `json` up to the end of the line.
    let body_start = match rest.find('\n') {
        Some(nl) if rest[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => nl + 1,
        _ => 0,
    };
    let body = &rest[body_start..];
    let end = body.find("```").unwrap_or(body.len());
    Some(&body[..end])
}

/// Try every `{` in order until one opens a balanced object that parses.
fn first_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        let end = balanced_end(&text[start..])?;
        match serde_json::from_str::<Value>(&text[start..start + end]) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    })
}

/// Byte length of the balanced object starting at `text[0] == '{'`.
/// Braces inside JSON strings are ignored.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// First non-blank string under any of `keys`. `"null"`/`"none"` count as absent.
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// A list of strings; a single comma-separated string is split.
fn list_field(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    let items: Vec<String> = match obj.get(key) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(|p| p.trim().to_string()).collect(),
        _ => Vec::new(),
    };
    items.into_iter().filter(|s| !s.is_empty()).collect()
}
