use crate::reconciler::PlanAssignment;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumString, VariantArray};

#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RollupGranularity {
    Day,
    Week,
    Month,
    Year,
}

impl RollupGranularity {
    /// Grouping key for a date. ISO week keys (`2026-W34`) so a week never
    /// straddles a key boundary mid-day across year ends.
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            RollupGranularity::Day => date.format("%Y-%m-%d").to_string(),
            RollupGranularity::Week => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            RollupGranularity::Month => date.format("%Y-%m").to_string(),
            RollupGranularity::Year => date.format("%Y").to_string(),
        }
    }
}

/// Running nutrient totals for one grouping key. Optional dish fields sum as
/// zero; no rounding happens during accumulation — formatting belongs to the
/// presentation boundary so daily, monthly, and yearly totals never drift
/// apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientTotals {
    pub dish_count: usize,
    pub calories: f64,
    pub protein_g: f64,
    pub carbohydrate_g: f64,
    pub fat_g: f64,
    pub sodium_mg: f64,
    pub potassium_mg: f64,
    pub phosphorus_mg: f64,
    pub fiber_g: f64,
}

impl NutrientTotals {
    fn add_dish(&mut self, facts: &hearthplate_dish::NutrientFacts) {
        self.dish_count += 1;
        self.calories += facts.calories_or_zero();
        self.protein_g += facts.protein_or_zero();
        self.carbohydrate_g += facts.carbohydrate_or_zero();
        self.fat_g += facts.fat_or_zero();
        self.sodium_mg += facts.sodium_or_zero();
        self.potassium_mg += facts.potassium_or_zero();
        self.phosphorus_mg += facts.phosphorus_or_zero();
        self.fiber_g += facts.fiber_or_zero();
    }

    pub fn merge(&mut self, other: &NutrientTotals) {
        self.dish_count += other.dish_count;
        self.calories += other.calories;
        self.protein_g += other.protein_g;
        self.carbohydrate_g += other.carbohydrate_g;
        self.fat_g += other.fat_g;
        self.sodium_mg += other.sodium_mg;
        self.potassium_mg += other.potassium_mg;
        self.phosphorus_mg += other.phosphorus_mg;
        self.fiber_g += other.fiber_g;
    }
}

/// Rolls assigned meals up into per-key nutrient totals for reporting.
///
/// A single linear pass with an accumulator map; composite meals contribute
/// every constituent dish. Pure over its input: recomputing from the same
/// assignment set yields bit-identical totals.
pub struct NutritionAggregator;

impl NutritionAggregator {
    pub fn rollup(
        assignments: &[PlanAssignment],
        granularity: RollupGranularity,
    ) -> BTreeMap<String, NutrientTotals> {
        let mut totals: BTreeMap<String, NutrientTotals> = BTreeMap::new();
        for assignment in assignments {
            let entry = totals.entry(granularity.key(assignment.date)).or_default();
            for dish in assignment.meal.dishes() {
                entry.add_dish(&dish.nutrients);
            }
        }
        totals
    }
}
