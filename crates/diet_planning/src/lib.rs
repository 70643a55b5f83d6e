//! Health-constrained diet composition engine.
//!
//! Pure, synchronous library: external collaborators load the dish catalog,
//! member profiles, allergy reference, and usage history, and persist the
//! emitted assignments. Composition itself performs no I/O.

pub mod allergy_filter;
pub mod disease_rules;
pub mod error;
pub mod nutrition;
pub mod reconciler;
pub mod variety;

pub use allergy_filter::{AllergySafetyFilter, SafetyCheck};
pub use disease_rules::{
    DiseaseConstraintScorer, DiseaseFinding, DiseaseRuleSet, DishScore, FindingKind, Nutrient,
    NutrientRule, Verdict,
};
pub use error::DietPlanningError;
pub use nutrition::{NutrientTotals, NutritionAggregator, RollupGranularity};
pub use reconciler::{
    FamilyPlanReconciler, MealSlotKind, MealStyle, PlanAssignment, SlotOutcome, SlotPlan,
};
pub use variety::{PlanScope, UsageRecord, VarietyTracker};
