use super::{extension, ExtractionOutput, TextExtractor};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv", "json"];
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// `<script>` and `<style>` elements including their content.
static HTML_SKIPPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)\s*>").unwrap());

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Reads text formats directly; HTML has its markup stripped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn supports(&self, path: &Path) -> bool {
        let ext = extension(path);
        TEXT_EXTENSIONS.contains(&ext.as_str()) || HTML_EXTENSIONS.contains(&ext.as_str())
    }

    async fn extract(&self, path: &Path) -> ExtractionOutput {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => return ExtractionOutput::failed(format!("Failed to read file: {}", e)),
        };
        let raw = String::from_utf8_lossy(&bytes);

        if HTML_EXTENSIONS.contains(&extension(path).as_str()) {
            ExtractionOutput::ok(strip_html(&raw)).with_metadata("type", "html")
        } else {
            ExtractionOutput::ok(raw.into_owned()).with_metadata("type", "text")
        }
    }
}

/// Drop markup, scripts and styles; decode the common entities.
pub fn strip_html(html: &str) -> String {
    let without_code = HTML_SKIPPED.replace_all(html, " ");
    let without_tags = HTML_TAG.replace_all(&without_code, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(|line| BLANK_RUN.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
