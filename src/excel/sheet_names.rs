//! Worksheet name rules

use crate::error::{ExportError, ExportResult};
use crate::types::ExperimentKey;
use std::collections::{BTreeMap, BTreeSet};

/// Excel sheet name maximum length
pub const MAX_SHEET_NAME_LEN: usize = 31;
/// Characters not allowed in sheet names
const ILLEGAL_CHARS: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// Replace illegal characters, trim, and cut to the Excel length limit
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if ILLEGAL_CHARS.contains(&c) { '-' } else { c })
        .collect();
    // Excel rejects names that start or end with an apostrophe
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    if cleaned.is_empty() {
        return "Sheet".to_string();
    }
    cleaned.chars().take(MAX_SHEET_NAME_LEN).collect()
}

/// Hands out unique sheet names (Excel compares them case-insensitively)
#[derive(Debug, Default)]
pub struct SheetNames {
    taken: BTreeSet<String>,
    by_key: BTreeMap<ExperimentKey, String>,
}

impl SheetNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a fixed, user-chosen name exactly as given
    pub fn reserve(&mut self, name: &str) -> ExportResult<String> {
        if sanitize_sheet_name(name) != name || !self.taken.insert(name.to_lowercase()) {
            return Err(ExportError::SheetName(name.to_string()));
        }
        Ok(name.to_string())
    }

    /// Claim a derived name, sanitized and suffixed if needed
    pub fn claim(&mut self, name: &str) -> String {
        self.unique(sanitize_sheet_name(name))
    }

    /// Name the raw data sheet of `key`
    pub fn assign(&mut self, key: &ExperimentKey) -> String {
        let name = self.unique(sanitize_sheet_name(&key.sheet_name()));
        self.by_key.insert(key.clone(), name.clone());
        name
    }

    pub fn get(&self, key: &ExperimentKey) -> Option<&str> {
        self.by_key.get(key).map(String::as_str)
    }

    pub fn by_key(&self) -> &BTreeMap<ExperimentKey, String> {
        &self.by_key
    }

    fn unique(&mut self, base: String) -> String {
        if self.taken.insert(base.to_lowercase()) {
            return base;
        }
        let mut n = 2usize;
        loop {
            let suffix = format!(" ({})", n);
            let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
            let stem: String = base.chars().take(keep).collect();
            let candidate = format!("{}{}", stem.trim_end(), suffix);
            if self.taken.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceName, Tag, TagStyle};

    fn key(device: &str, density: f64) -> ExperimentKey {
        ExperimentKey::new(
            DeviceName::new(device),
            Tag::voltage(1000.0),
            Tag::lifetime(1e-10, TagStyle::Fixed),
            Tag::density(density, TagStyle::Fixed),
        )
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b[c]"), "a-b-c-");
        assert_eq!(sanitize_sheet_name("  "), "Sheet");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn test_short_names_pass_through() {
        let mut names = SheetNames::new();
        let k = ExperimentKey::new(
            DeviceName::new("PC"),
            Tag::voltage(5.0),
            Tag::lifetime(0.001, TagStyle::Fixed),
            Tag::density(0.0001, TagStyle::Fixed),
        );
        assert_eq!(names.assign(&k), "PC 5V τ=1.00e-3 D=1.00e-4");
        assert_eq!(names.get(&k), Some("PC 5V τ=1.00e-3 D=1.00e-4"));
    }

    #[test]
    fn test_truncated_names_stay_unique() {
        let mut names = SheetNames::new();
        // "Diode 1000V τ=1.00e-10 D=1.00e-14" is 33 chars; both cut to "... D=1.00e-"
        let a = names.assign(&key("Diode", 1e-14));
        let b = names.assign(&key("Diode", 1e-15));
        assert_eq!(a.chars().count(), MAX_SHEET_NAME_LEN);
        assert_ne!(a.to_lowercase(), b.to_lowercase());
        assert!(b.ends_with(" (2)"));
        assert!(b.chars().count() <= MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn test_reserve_rejects_duplicates_and_illegal_names() {
        let mut names = SheetNames::new();
        assert_eq!(names.reserve("All Charge Integrals").unwrap(), "All Charge Integrals");
        assert!(names.reserve("all charge integrals").is_err());
        assert!(names.reserve("bad/name").is_err());
    }

    #[test]
    fn test_claim_fits_long_derived_names() {
        let mut names = SheetNames::new();
        names.reserve("All Charge Integrals").unwrap();

        let a = names.claim("Reference Charge Integral Analysis");
        assert_eq!(a, "Reference Charge Integral Analy");
        assert_eq!(a.chars().count(), MAX_SHEET_NAME_LEN);

        let b = names.claim("all charge integrals");
        assert_eq!(b, "all charge integrals (2)");
    }
}
