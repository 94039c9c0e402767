//! Numbering rules for a taxonomy.
//!
//! Pure functions over a [`Taxonomy`]; every violation is collected so a
//! caller can report all problems at once.

use super::{area_range, category_belongs_to_area, category_number, is_system_area};
use super::{is_valid_area_name, is_valid_category_name, Taxonomy};
use crate::{JdexError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// User areas allowed besides the reserved `00-09` system area.
pub const MAX_USER_AREAS: usize = 9;

pub const MAX_CATEGORIES_PER_AREA: usize = 10;

/// The ten legal decade ranges. `00-09` is reserved for the system area.
pub const AREA_RANGES: [(u8, u8); 10] = [
    (0, 9),
    (10, 19),
    (20, 29),
    (30, 39),
    (40, 49),
    (50, 59),
    (60, 69),
    (70, 79),
    (80, 89),
    (90, 99),
];

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Convert into `Err(JdexError::Validation)` when anything was violated.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(JdexError::Validation {
                violations: self.violations,
            })
        }
    }
}

/// Check every numbering rule.
pub fn validate(taxonomy: &Taxonomy) -> ValidationReport {
    let mut violations = Vec::new();
    let areas = taxonomy.areas();

    let user_areas = areas.keys().filter(|a| !is_system_area(a)).count();
    if user_areas > MAX_USER_AREAS {
        violations.push(format!(
            "Too many areas: {user_areas} (max {MAX_USER_AREAS} user areas)"
        ));
    }

    let mut used_ranges = HashSet::new();
    for (area_name, area) in areas {
        if !is_valid_area_name(area_name) {
            violations.push(format!(
                "Invalid area name format: '{area_name}' (expected 'XX-XX Name')"
            ));
            continue;
        }

        if let Some(range) = area_range(area_name) {
            if !used_ranges.insert(range) {
                violations.push(format!("Duplicate area range: {area_name}"));
            }
            if !AREA_RANGES.contains(&range) {
                violations.push(format!(
                    "Invalid area range: {area_name} (must be X0-X9 pattern)"
                ));
            }
        }

        let count = area.categories.len();
        if count > MAX_CATEGORIES_PER_AREA {
            violations.push(format!(
                "Too many categories in {area_name}: {count} (max {MAX_CATEGORIES_PER_AREA})"
            ));
        }

        let mut used_numbers = HashSet::new();
        for cat_name in area.categories.keys() {
            if !is_valid_category_name(cat_name) {
                violations.push(format!(
                    "Invalid category name format: '{cat_name}' in {area_name}"
                ));
                continue;
            }
            if !category_belongs_to_area(cat_name, area_name) {
                violations.push(format!("Category {cat_name} outside range for {area_name}"));
            }
            if let Some(num) = category_number(cat_name) {
                if !used_numbers.insert(num) {
                    violations.push(format!("Duplicate category number {num} in {area_name}"));
                }
            }
        }
    }

    ValidationReport { violations }
}

/// First unused number in the area's range, or `None` when the area is full
/// or its name has no range.
pub fn next_free_category_number<V>(area: &str, existing: &BTreeMap<String, V>) -> Option<u8> {
    let (lo, hi) = area_range(area)?;
    let used: HashSet<u8> = existing.keys().filter_map(|c| category_number(c)).collect();
    (lo..=hi).find(|n| !used.contains(n))
}

/// First legal decade not used by any existing area.
pub fn next_free_area_range<V>(existing: &BTreeMap<String, V>) -> Option<(u8, u8)> {
    let used: HashSet<(u8, u8)> = existing.keys().filter_map(|a| area_range(a)).collect();
    AREA_RANGES.iter().copied().find(|r| !used.contains(r))
}
