use crate::types::AllergySeverity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One allergy in the reference dataset.
///
/// `derived_ingredients` lists ingredient names that are not the allergen
/// itself but are known to contain or derive from it (e.g. "oyster sauce"
/// for a shellfish allergy). The reference is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergyEntry {
    pub code: String,
    pub display_name: String,
    pub severity: AllergySeverity,
    pub derived_ingredients: Vec<String>,
}

/// The injected allergy → derived-ingredient reference dataset.
///
/// Loaded by an external collaborator before composition runs. The
/// `Unavailable` state is an explicit fail-closed marker: the safety filter
/// must treat it as "every dish unsafe for any allergic member", never as an
/// empty-but-fine dataset. Versioned so locale or revision swaps never touch
/// call sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AllergyCatalog {
    Available {
        version: String,
        entries: HashMap<String, AllergyEntry>,
    },
    Unavailable,
}

impl AllergyCatalog {
    pub fn from_entries(version: impl Into<String>, entries: Vec<AllergyEntry>) -> Self {
        AllergyCatalog::Available {
            version: version.into(),
            entries: entries.into_iter().map(|e| (e.code.clone(), e)).collect(),
        }
    }

    /// Fail-closed marker for a reference that could not be loaded.
    pub fn unavailable() -> Self {
        AllergyCatalog::Unavailable
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AllergyCatalog::Available { .. })
    }

    /// Look up one allergy code. `None` for unknown codes and for the
    /// unavailable catalog; the caller decides whether that is a
    /// data-quality warning or a fail-closed condition.
    pub fn get(&self, code: &str) -> Option<&AllergyEntry> {
        match self {
            AllergyCatalog::Available { entries, .. } => entries.get(code),
            AllergyCatalog::Unavailable => None,
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            AllergyCatalog::Available { version, .. } => Some(version.as_str()),
            AllergyCatalog::Unavailable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shellfish_entry() -> AllergyEntry {
        AllergyEntry {
            code: "shellfish".to_string(),
            display_name: "Shellfish".to_string(),
            severity: AllergySeverity::Critical,
            derived_ingredients: vec!["oyster sauce".to_string(), "shrimp paste".to_string()],
        }
    }

    #[test]
    fn test_lookup_by_code() {
        let catalog = AllergyCatalog::from_entries("2026-01", vec![shellfish_entry()]);
        assert!(catalog.is_available());
        assert_eq!(catalog.version(), Some("2026-01"));

        let entry = catalog.get("shellfish").unwrap();
        assert_eq!(entry.display_name, "Shellfish");
        assert_eq!(entry.derived_ingredients.len(), 2);

        assert!(catalog.get("pollen").is_none());
    }

    #[test]
    fn test_unavailable_catalog_has_no_entries() {
        let catalog = AllergyCatalog::unavailable();
        assert!(!catalog.is_available());
        assert!(catalog.get("shellfish").is_none());
        assert_eq!(catalog.version(), None);
    }
}
