//! Filesystem-safe naming for organized documents.
//!
//! Organized files are named `"<id> <descriptor> <year><ext>"`, for example
//! `14.01 Amazon Laptop Receipt 2024.pdf`.

use chrono::Datelike;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Maximum length (in characters) of the issuer and document-type parts.
pub const MAX_PART_LENGTH: usize = 30;

/// Descriptor used when nothing better can be derived.
pub const FALLBACK_DESCRIPTOR: &str = "Document";

/// Characters reserved on NTFS that must be removed.
const NTFS_RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Placeholder values backends emit when they know nothing.
const PLACEHOLDER_ISSUERS: &[&str] = &["unknown", "n/a", "none", "null"];
const PLACEHOLDER_TYPES: &[&str] = &["document", "unknown", "n/a", "none", "null"];

/// Regex for runs of whitespace.
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Four-digit years 1900-2099.
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:19|20)\d{2}").unwrap());

/// Dates and bare years embedded in scanner-style filenames.
static FILENAME_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \b(?:19|20)\d{2}[-_.]?\d{2}[-_.]?\d{2}\b   # 2024-03-05, 20240305
        | \b\d{1,2}[-_.]\d{1,2}[-_.](?:19|20)\d{2}\b # 05.03.2024
        | \b(?:19|20)\d{2}\b                        # 2024
        ",
    )
    .unwrap()
});

/// Strip NTFS-reserved and control characters, collapse whitespace, and trim
/// separators from both ends.
pub fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if NTFS_RESERVED_CHARS.contains(&c) || c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect();
    let collapsed = WHITESPACE.replace_all(&cleaned, " ");
    collapsed
        .trim_matches(|c: char| c == ' ' || c == '.' || c == '_' || c == '-')
        .to_string()
}

/// Truncate to `max` characters on a char boundary and re-trim.
pub fn cap_length(value: &str, max: usize) -> String {
    let truncated: String = value.chars().take(max).collect();
    truncated.trim_end_matches([' ', '.', '-', '_']).to_string()
}

/// Human-readable descriptor from issuer and document type.
///
/// Each part is sanitized and capped at [`MAX_PART_LENGTH`]. Placeholder values
/// count as absent. With both absent the original filename is title-cased and
/// stripped of dates, and failing that [`FALLBACK_DESCRIPTOR`] is used.
pub fn descriptor(issuer: &str, document_type: &str, original_name: &str) -> String {
    let issuer = meaningful(issuer, PLACEHOLDER_ISSUERS);
    let document_type = meaningful(document_type, PLACEHOLDER_TYPES);

    let parts: Vec<String> = [issuer, document_type].into_iter().flatten().collect();
    if !parts.is_empty() {
        return parts.join(" ");
    }

    let stem = Path::new(original_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let from_name = cap_length(&title_case(&strip_dates(&stem)), MAX_PART_LENGTH * 2);
    if from_name.is_empty() {
        FALLBACK_DESCRIPTOR.to_string()
    } else {
        from_name
    }
}

fn meaningful(value: &str, placeholders: &[&str]) -> Option<String> {
    let cleaned = cap_length(&sanitize_component(value), MAX_PART_LENGTH);
    if cleaned.is_empty() || placeholders.contains(&cleaned.to_lowercase().as_str()) {
        None
    } else {
        Some(cleaned)
    }
}

fn strip_dates(stem: &str) -> String {
    // Underscores are word characters; split on them first so `\b` sees dates.
    let spaced = stem.replace('_', " ");
    let without = FILENAME_DATE.replace_all(&spaced, " ");
    sanitize_component(&without.replace('-', " "))
}

fn title_case(value: &str) -> String {
    value
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// First four-digit year in a mentioned date.
pub fn extract_year(date: Option<&str>) -> Option<String> {
    YEAR.find(date?).map(|m| m.as_str().to_string())
}

/// Year of a mentioned date, else the current year.
pub fn year_or_current(date: Option<&str>) -> String {
    extract_year(date).unwrap_or_else(|| chrono::Local::now().year().to_string())
}

/// `"<id> <descriptor> <year><ext>"`. `extension` includes its dot or is empty.
pub fn build_filename(jd_id: &str, descriptor: &str, year: &str, extension: &str) -> String {
    format!("{jd_id} {descriptor} {year}{extension}")
}

/// Original extension with its leading dot, or empty.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// First path in `dir` named `file_name`, or `stem_N.ext` for N = 1, 2, ...,
/// that does not exist yet.
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() && !candidate.is_symlink() {
        return candidate;
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let extension = extension_of(as_path);

    let mut counter = 1u32;
    loop {
        let candidate = dir.join(format!("{stem}_{counter}{extension}"));
        if !candidate.exists() && !candidate.is_symlink() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("Amazon: EU/DE"), "Amazon EU DE");
        assert_eq!(sanitize_component("  Tax   Return\t2023 "), "Tax Return 2023");
        assert_eq!(sanitize_component("a\\b|c?d*e"), "a b c d e");
        assert_eq!(sanitize_component("..."), "");
    }

    #[test]
    fn test_descriptor_from_issuer_and_type() {
        assert_eq!(descriptor("Amazon", "Laptop Receipt", "scan.pdf"), "Amazon Laptop Receipt");
        assert_eq!(descriptor("Unknown", "Invoice", "scan.pdf"), "Invoice");
        assert_eq!(descriptor("TK Insurance", "Document", "scan.pdf"), "TK Insurance");
    }

    #[test]
    fn test_descriptor_caps_each_part() {
        let long = "A".repeat(80);
        let result = descriptor(&long, "Receipt", "x.pdf");
        assert_eq!(result, format!("{} Receipt", "A".repeat(MAX_PART_LENGTH)));
        assert!(!result.contains('/'));
    }

    #[test]
    fn test_descriptor_falls_back_to_filename() {
        assert_eq!(
            descriptor("Unknown", "Document", "scan_2024-03-05_electricity-bill.pdf"),
            "Scan Electricity Bill"
        );
        assert_eq!(descriptor("", "", "20240305.pdf"), "Document");
        assert_eq!(descriptor("", "", ""), "Document");
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year(Some("2024-12-20")).as_deref(), Some("2024"));
        assert_eq!(extract_year(Some("20.12.2024")).as_deref(), Some("2024"));
        assert_eq!(extract_year(Some("12/20/2024")).as_deref(), Some("2024"));
        assert_eq!(extract_year(Some("no date")), None);
        assert_eq!(extract_year(None), None);
        assert_eq!(year_or_current(None).len(), 4);
    }

    #[test]
    fn test_build_filename() {
        let name = build_filename("14.01", "Amazon Laptop Receipt", "2024", ".pdf");
        assert_eq!(name, "14.01 Amazon Laptop Receipt 2024.pdf");
        assert!(name.starts_with("14.01"));
        assert!(name.ends_with(".pdf"));
        assert_eq!(extension_of(Path::new("a/b.tar")), ".tar");
        assert_eq!(extension_of(Path::new("README")), "");
    }

    #[test]
    fn test_unique_destination() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let name = "14.01 Amazon 2024.pdf";

        assert_eq!(unique_destination(dir, name), dir.join(name));
        std::fs::write(dir.join(name), b"a").unwrap();
        assert_eq!(unique_destination(dir, name), dir.join("14.01 Amazon 2024_1.pdf"));
        std::fs::write(dir.join("14.01 Amazon 2024_1.pdf"), b"b").unwrap();
        assert_eq!(unique_destination(dir, name), dir.join("14.01 Amazon 2024_2.pdf"));
    }
}
