//! The Johnny.Decimal taxonomy: areas spanning a decade of numbers, each
//! holding up to ten numbered categories.
//!
//! Areas and categories are kept in `BTreeMap`s so enumeration order is the
//! natural numbering order (`00-09 System` before `10-19 Finance`, `11 Banking`
//! before `14 Receipts`). Keyword scoring relies on that order for tie-breaks.

mod store;
pub mod templates;
mod validator;

pub use store::{
    ClassificationStats, ConfidenceCounts, Evolution, GenerationMethod, HistoryEntry,
    JdexDocument, JdexMeta, TaxonomyStore,
};
pub use validator::{
    next_free_area_range, next_free_category_number, validate, ValidationReport, AREA_RANGES,
    MAX_CATEGORIES_PER_AREA, MAX_USER_AREAS,
};

use crate::config::ClassifierConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `XX-YY Name`.
static AREA_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})-(\d{2})\s+\S").unwrap());

/// `NN Name`.
static CATEGORY_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{2})\s+\S").unwrap());

/// A leaf bucket carrying classification keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub description: String,
    pub keywords: Vec<String>,
    pub examples: Vec<String>,
    pub document_count: u64,
    pub last_document: Option<String>,
}

impl Category {
    pub fn with_keywords(description: &str, keywords: &[&str]) -> Self {
        Self {
            description: description.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        }
    }
}

/// A top-level bucket spanning one decade of category numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Area {
    pub description: String,
    pub categories: BTreeMap<String, Category>,
}

/// Mapping of area name to area definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    areas: BTreeMap<String, Area>,
}

/// A borrowed `(area, category)` location in a taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRef<'a> {
    pub area: &'a str,
    pub category: &'a str,
    pub definition: &'a Category,
}

impl Taxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_areas(areas: BTreeMap<String, Area>) -> Self {
        Self { areas }
    }

    pub fn areas(&self) -> &BTreeMap<String, Area> {
        &self.areas
    }

    pub fn areas_mut(&mut self) -> &mut BTreeMap<String, Area> {
        &mut self.areas
    }

    pub fn area(&self, name: &str) -> Option<&Area> {
        self.areas.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Builder-style insertion used by templates and tests. Not validated.
    pub fn with_area(mut self, name: &str, description: &str, categories: &[(&str, &[&str])]) -> Self {
        let area = Area {
            description: description.to_string(),
            categories: categories
                .iter()
                .map(|(cat, keywords)| (cat.to_string(), Category::with_keywords("", keywords)))
                .collect(),
        };
        self.areas.insert(name.to_string(), area);
        self
    }

    /// Every category in stable enumeration order.
    pub fn categories(&self) -> impl Iterator<Item = CategoryRef<'_>> {
        self.areas.iter().flat_map(|(area, def)| {
            def.categories.iter().map(move |(category, definition)| CategoryRef {
                area,
                category,
                definition,
            })
        })
    }

    /// Categories a classifier may choose: everything outside the system and
    /// archive areas.
    pub fn eligible_categories(&self) -> impl Iterator<Item = CategoryRef<'_>> {
        self.categories().filter(|c| !is_excluded_area(c.area))
    }

    pub fn contains(&self, area: &str, category: &str) -> bool {
        self.areas
            .get(area)
            .is_some_and(|a| a.categories.contains_key(category))
    }

    /// Find a category by exact name in any area.
    pub fn find_category(&self, category: &str) -> Option<CategoryRef<'_>> {
        self.categories().find(|c| c.category == category)
    }

    /// Find a category by its two-digit number in any area.
    pub fn find_by_number(&self, number: u8) -> Option<CategoryRef<'_>> {
        self.categories()
            .find(|c| category_number(c.category) == Some(number))
    }

    pub fn category_mut(&mut self, area: &str, category: &str) -> Option<&mut Category> {
        self.areas
            .get_mut(area)
            .and_then(|a| a.categories.get_mut(category))
    }
}

/// True if `name` follows the `XX-YY Name` pattern.
pub fn is_valid_area_name(name: &str) -> bool {
    AREA_NAME.is_match(name)
}

/// True if `name` follows the `NN Name` pattern.
pub fn is_valid_category_name(name: &str) -> bool {
    CATEGORY_NAME.is_match(name)
}

/// Numeric range of an area name: `"10-19 Finance"` -> `(10, 19)`.
pub fn area_range(name: &str) -> Option<(u8, u8)> {
    let caps = AREA_NAME.captures(name)?;
    let lo = caps.get(1)?.as_str().parse().ok()?;
    let hi = caps.get(2)?.as_str().parse().ok()?;
    Some((lo, hi))
}

/// Number of a category name: `"14 Receipts"` -> `14`.
pub fn category_number(name: &str) -> Option<u8> {
    CATEGORY_NAME.captures(name)?.get(1)?.as_str().parse().ok()
}

/// Two-digit prefix used in identifiers: `"14 Receipts"` -> `"14"`.
pub fn category_prefix(name: &str) -> Option<&str> {
    CATEGORY_NAME.captures(name).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// True if the category's number lies inside the area's range.
pub fn category_belongs_to_area(category: &str, area: &str) -> bool {
    match (category_number(category), area_range(area)) {
        (Some(num), Some((lo, hi))) => lo <= num && num <= hi,
        _ => false,
    }
}

/// The reserved `00-09` system area.
pub fn is_system_area(name: &str) -> bool {
    name.starts_with("00-09")
}

/// Areas hidden from classifiers (system and archive).
pub fn is_excluded_area(name: &str) -> bool {
    ClassifierConfig::EXCLUDED_AREAS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Taxonomy {
        Taxonomy::new()
            .with_area("00-09 System", "", &[("00 Index", &[]), ("01 Inbox", &[])])
            .with_area(
                "10-19 Finance",
                "Money",
                &[("11 Banking", &["bank"]), ("14 Receipts", &["receipt", "purchase"])],
            )
            .with_area("20-29 Medical", "", &[("21 Records", &["doctor"])])
    }

    #[test]
    fn test_name_parsing() {
        assert_eq!(area_range("10-19 Finance"), Some((10, 19)));
        assert_eq!(area_range("10-19Finance"), None);
        assert_eq!(area_range("Finance"), None);
        assert_eq!(category_number("14 Receipts"), Some(14));
        assert_eq!(category_number("4 Receipts"), None);
        assert_eq!(category_prefix("07 Misc"), Some("07"));
        assert!(is_valid_area_name("90-99 Archive"));
        assert!(!is_valid_area_name("90-99 "));
        assert!(is_valid_category_name("01 Inbox"));
        assert!(!is_valid_category_name("Inbox"));
    }

    #[test]
    fn test_category_membership() {
        assert!(category_belongs_to_area("14 Receipts", "10-19 Finance"));
        assert!(category_belongs_to_area("19 Other", "10-19 Finance"));
        assert!(!category_belongs_to_area("21 Records", "10-19 Finance"));
        assert!(!category_belongs_to_area("Receipts", "10-19 Finance"));
    }

    #[test]
    fn test_enumeration_is_numeric_order() {
        let tax = sample();
        let names: Vec<_> = tax.categories().map(|c| c.category).collect();
        assert_eq!(
            names,
            vec!["00 Index", "01 Inbox", "11 Banking", "14 Receipts", "21 Records"]
        );
        let eligible: Vec<_> = tax.eligible_categories().map(|c| c.category).collect();
        assert_eq!(eligible, vec!["11 Banking", "14 Receipts", "21 Records"]);
    }

    #[test]
    fn test_lookups() {
        let tax = sample();
        assert!(tax.contains("10-19 Finance", "14 Receipts"));
        assert!(!tax.contains("20-29 Medical", "14 Receipts"));
        assert_eq!(tax.find_category("21 Records").unwrap().area, "20-29 Medical");
        assert_eq!(tax.find_by_number(14).unwrap().category, "14 Receipts");
        assert!(tax.find_by_number(55).is_none());
    }

    #[test]
    fn test_serializes_as_plain_area_map() {
        let tax = sample();
        let value = serde_json::to_value(&tax).unwrap();
        assert!(value["10-19 Finance"]["categories"]["14 Receipts"]["keywords"].is_array());
        let back: Taxonomy = serde_json::from_value(value).unwrap();
        assert_eq!(back, tax);
    }
}
