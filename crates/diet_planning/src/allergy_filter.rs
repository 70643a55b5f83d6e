use crate::error::DietPlanningError;
use hearthplate_dish::Dish;
use hearthplate_household::{AllergyCatalog, AllergySeverity};
use serde::{Deserialize, Serialize};

/// Outcome of checking one dish against one member's declared allergies.
///
/// `matched_allergens` holds direct display-name matches, `matched_derived`
/// holds derived-ingredient matches (ingredients known to contain the
/// allergen without naming it). `advisory` is set whenever a dish is
/// admitted for a member who has any declared allergy, so the caller can
/// render the "ingredient information may vary — verify before eating"
/// banner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyCheck {
    pub safe: bool,
    pub matched_allergens: Vec<String>,
    pub matched_derived: Vec<String>,
    pub severity: Option<AllergySeverity>,
    pub advisory: bool,
}

impl SafetyCheck {
    fn safe_no_allergies() -> Self {
        SafetyCheck {
            safe: true,
            matched_allergens: Vec::new(),
            matched_derived: Vec::new(),
            severity: None,
            advisory: false,
        }
    }
}

/// Zero-tolerance allergy gate.
///
/// # Business Rules
/// - **Over-match, never under-match**: broad lowercase substring
///   containment over the dish's full text corpus. A false positive costs a
///   menu option; a false negative is the unacceptable failure mode.
/// - **Derived ingredients count**: a match on any derived-ingredient name
///   flags the dish unsafe even when the allergen itself is never named.
/// - **Fail closed**: with an unavailable reference catalog, no dish is ever
///   reported safe for a member with declared allergies.
///
/// Pure function over its inputs plus the injected reference catalog; no
/// side effects beyond data-quality log lines.
pub struct AllergySafetyFilter<'a> {
    catalog: &'a AllergyCatalog,
}

impl<'a> AllergySafetyFilter<'a> {
    pub fn new(catalog: &'a AllergyCatalog) -> Self {
        AllergySafetyFilter { catalog }
    }

    /// Report the fail-closed condition up front. Composition itself never
    /// aborts on this — it proceeds treating every dish as unsafe — but
    /// callers that want to surface the outage before planning can.
    pub fn ensure_reference(&self) -> Result<(), DietPlanningError> {
        if self.catalog.is_available() {
            Ok(())
        } else {
            Err(DietPlanningError::SafetyReferenceUnavailable)
        }
    }

    /// Check one dish against a member's declared allergy codes.
    pub fn is_safe(&self, dish: &Dish, allergy_codes: &[String]) -> SafetyCheck {
        if allergy_codes.is_empty() {
            return SafetyCheck::safe_no_allergies();
        }

        let corpus = dish.text_corpus();

        if !self.catalog.is_available() {
            return self.fail_closed(dish, allergy_codes, &corpus);
        }

        let mut matched_allergens = Vec::new();
        let mut matched_derived = Vec::new();
        let mut direct_critical = false;

        for code in allergy_codes {
            let Some(entry) = self.catalog.get(code) else {
                // Unknown code: no match contribution, logged for
                // data-quality tracking.
                tracing::warn!(allergy_code = %code, "unknown allergy code in member profile");
                continue;
            };

            if corpus.contains(&entry.display_name.to_lowercase()) {
                direct_critical |= entry.severity == AllergySeverity::Critical;
                matched_allergens.push(entry.display_name.clone());
            }

            for derived in &entry.derived_ingredients {
                if corpus.contains(&derived.to_lowercase()) {
                    matched_derived.push(derived.clone());
                }
            }
        }

        // Direct matches report the member's worst matched class, floored at
        // High. Derived-only matches are always High: indirect evidence is
        // serious but never escalated to Critical on its own.
        let severity = if !matched_allergens.is_empty() {
            Some(if direct_critical {
                AllergySeverity::Critical
            } else {
                AllergySeverity::High
            })
        } else if !matched_derived.is_empty() {
            Some(AllergySeverity::High)
        } else {
            None
        };

        let safe = severity.is_none();
        SafetyCheck {
            safe,
            matched_allergens,
            matched_derived,
            severity,
            // Dish admitted for an allergic member: surface the
            // verify-before-eating banner.
            advisory: safe,
        }
    }

    /// Unavailable reference: every dish is unsafe for an allergic member.
    /// Direct matches of the raw codes are still reported so the caller's
    /// banner can name what was found.
    fn fail_closed(&self, dish: &Dish, allergy_codes: &[String], corpus: &str) -> SafetyCheck {
        tracing::warn!(
            dish_id = %dish.id,
            "allergy reference unavailable; failing closed for allergic member"
        );

        let matched_allergens: Vec<String> = allergy_codes
            .iter()
            .filter(|code| corpus.contains(&code.replace('_', " ").to_lowercase()))
            .cloned()
            .collect();

        SafetyCheck {
            safe: false,
            matched_allergens,
            matched_derived: Vec::new(),
            severity: Some(AllergySeverity::High),
            advisory: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearthplate_dish::{DishRole, NutrientFacts};
    use hearthplate_household::AllergyEntry;

    fn dish_with_text(name: &str, ingredients: Vec<&str>, seasonings: Vec<&str>) -> Dish {
        Dish {
            id: format!("dish-{}", name.to_lowercase().replace(' ', "-")),
            name: name.to_string(),
            ingredients: ingredients.into_iter().map(String::from).collect(),
            seasonings: seasonings.into_iter().map(String::from).collect(),
            role: DishRole::Standalone,
            nutrients: NutrientFacts::default(),
        }
    }

    fn catalog() -> AllergyCatalog {
        AllergyCatalog::from_entries(
            "test",
            vec![
                AllergyEntry {
                    code: "peanut".to_string(),
                    display_name: "Peanut".to_string(),
                    severity: AllergySeverity::Critical,
                    derived_ingredients: vec!["satay sauce".to_string()],
                },
                AllergyEntry {
                    code: "shellfish".to_string(),
                    display_name: "Shellfish".to_string(),
                    severity: AllergySeverity::High,
                    derived_ingredients: vec!["oyster sauce".to_string()],
                },
                AllergyEntry {
                    code: "milk".to_string(),
                    display_name: "Milk".to_string(),
                    severity: AllergySeverity::Moderate,
                    derived_ingredients: vec!["butter".to_string(), "cream".to_string()],
                },
            ],
        )
    }

    #[test]
    fn test_no_declared_allergies_is_safe_without_advisory() {
        let catalog = catalog();
        let filter = AllergySafetyFilter::new(&catalog);
        let dish = dish_with_text("Peanut Noodles", vec!["peanut", "noodles"], vec![]);

        let check = filter.is_safe(&dish, &[]);
        assert!(check.safe);
        assert!(!check.advisory);
        assert!(check.severity.is_none());
    }

    #[test]
    fn test_direct_match_flags_unsafe() {
        let catalog = catalog();
        let filter = AllergySafetyFilter::new(&catalog);
        let dish = dish_with_text("Kung Pao Chicken", vec!["chicken", "Peanut"], vec![]);

        let check = filter.is_safe(&dish, &["peanut".to_string()]);
        assert!(!check.safe);
        assert_eq!(check.matched_allergens, vec!["Peanut"]);
        assert_eq!(check.severity, Some(AllergySeverity::Critical));
    }

    #[test]
    fn test_direct_match_of_moderate_allergy_reports_high() {
        let catalog = catalog();
        let filter = AllergySafetyFilter::new(&catalog);
        let dish = dish_with_text("Milk Tea", vec!["milk", "tea"], vec![]);

        let check = filter.is_safe(&dish, &["milk".to_string()]);
        assert!(!check.safe);
        // Direct matches are floored at High even for a Moderate-class
        // allergy.
        assert_eq!(check.severity, Some(AllergySeverity::High));
    }

    #[test]
    fn test_derived_only_match_is_high_never_critical() {
        let catalog = catalog();
        let filter = AllergySafetyFilter::new(&catalog);
        // Satay sauce derives from peanut (Critical class), but the word
        // "peanut" never appears.
        let dish = dish_with_text("Chicken Skewers", vec!["chicken"], vec!["Satay Sauce"]);

        let check = filter.is_safe(&dish, &["peanut".to_string()]);
        assert!(!check.safe);
        assert!(check.matched_allergens.is_empty());
        assert_eq!(check.matched_derived, vec!["satay sauce"]);
        assert_eq!(check.severity, Some(AllergySeverity::High));
    }

    #[test]
    fn test_oyster_sauce_catches_indirect_shellfish() {
        let catalog = catalog();
        let filter = AllergySafetyFilter::new(&catalog);
        let dish = dish_with_text("Stir-Fried Greens", vec!["gai lan"], vec!["oyster sauce"]);

        let check = filter.is_safe(&dish, &["shellfish".to_string()]);
        assert!(!check.safe);
        assert_eq!(check.matched_derived, vec!["oyster sauce"]);
        assert_eq!(check.severity, Some(AllergySeverity::High));
    }

    #[test]
    fn test_safe_dish_carries_advisory_banner() {
        let catalog = catalog();
        let filter = AllergySafetyFilter::new(&catalog);
        let dish = dish_with_text("Steamed Rice", vec!["rice", "water"], vec![]);

        let check = filter.is_safe(&dish, &["peanut".to_string()]);
        assert!(check.safe);
        assert!(check.advisory, "admitted dish for allergic member must carry advisory");
    }

    #[test]
    fn test_unknown_code_contributes_no_match() {
        let catalog = catalog();
        let filter = AllergySafetyFilter::new(&catalog);
        let dish = dish_with_text("Steamed Rice", vec!["rice"], vec![]);

        let check = filter.is_safe(&dish, &["pollen".to_string()]);
        assert!(check.safe);
        assert!(check.matched_allergens.is_empty());
    }

    #[test]
    fn test_fail_closed_marks_every_dish_unsafe() {
        let catalog = AllergyCatalog::unavailable();
        let filter = AllergySafetyFilter::new(&catalog);
        assert!(matches!(
            filter.ensure_reference(),
            Err(DietPlanningError::SafetyReferenceUnavailable)
        ));

        let with_allergen = dish_with_text("Peanut Soup", vec!["peanut"], vec![]);
        let without_allergen = dish_with_text("Steamed Rice", vec!["rice"], vec![]);

        let check = filter.is_safe(&with_allergen, &["peanut".to_string()]);
        assert!(!check.safe);
        assert_eq!(check.matched_allergens, vec!["peanut"]);

        // Even a dish with no textual match is unsafe: never fail open.
        let check = filter.is_safe(&without_allergen, &["peanut".to_string()]);
        assert!(!check.safe);
        assert!(check.matched_allergens.is_empty());
    }

    #[test]
    fn test_multiple_allergies_worst_class_wins() {
        let catalog = catalog();
        let filter = AllergySafetyFilter::new(&catalog);
        let dish = dish_with_text("Peanut Butter Shake", vec!["peanut", "milk"], vec![]);

        let check = filter.is_safe(&dish, &["milk".to_string(), "peanut".to_string()]);
        assert!(!check.safe);
        assert_eq!(check.severity, Some(AllergySeverity::Critical));
        assert_eq!(check.matched_allergens.len(), 2);
    }
}
