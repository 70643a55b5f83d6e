use crate::allergy_filter::AllergySafetyFilter;
use crate::disease_rules::{DiseaseConstraintScorer, DiseaseRuleSet, DishScore, FindingKind};
use crate::error::DietPlanningError;
use crate::variety::{PlanScope, VarietyTracker};
use chrono::NaiveDate;
use hearthplate_dish::{AssignedMeal, Dish, DishRole};
use hearthplate_household::{AllergyCatalog, Member};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};
use uuid::Uuid;

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
    Hash,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MealSlotKind {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

/// How a slot is composed: one standalone dish, or a composite meal with
/// staple/side/soup positions filled independently from role-tagged catalog
/// partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MealStyle {
    Single,
    Composite { side_count: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotPlan {
    pub slot: MealSlotKind,
    pub style: MealStyle,
}

impl SlotPlan {
    pub fn single(slot: MealSlotKind) -> Self {
        SlotPlan {
            slot,
            style: MealStyle::Single,
        }
    }

    pub fn composite(slot: MealSlotKind, side_count: usize) -> Self {
        SlotPlan {
            slot,
            style: MealStyle::Composite { side_count },
        }
    }

    /// The usual three single-dish meals of a day.
    pub fn standard_day() -> Vec<SlotPlan> {
        vec![
            SlotPlan::single(MealSlotKind::Breakfast),
            SlotPlan::single(MealSlotKind::Lunch),
            SlotPlan::single(MealSlotKind::Dinner),
        ]
    }
}

/// One emitted assignment. Immutable once created; a regenerated day
/// replaces the prior set for that date wholesale (the persistence
/// collaborator's concern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanAssignment {
    pub id: String,
    pub date: NaiveDate,
    pub slot: MealSlotKind,
    pub scope: PlanScope,
    pub meal: AssignedMeal,
    pub rationale: String,
    pub is_unified: bool,
}

/// Terminal state of one slot-scope pair. `Unassignable` is a legitimate
/// outcome — zero allergy-safe dishes for a member is surfaced as an
/// explicit gap, never silently filled with an unsafe dish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SlotOutcome {
    Assigned(PlanAssignment),
    Unassignable {
        date: NaiveDate,
        slot: MealSlotKind,
        scope: PlanScope,
        reason: String,
    },
}

impl SlotOutcome {
    pub fn assignment(&self) -> Option<&PlanAssignment> {
        match self {
            SlotOutcome::Assigned(assignment) => Some(assignment),
            SlotOutcome::Unassignable { .. } => None,
        }
    }

    pub fn is_unassignable(&self) -> bool {
        matches!(self, SlotOutcome::Unassignable { .. })
    }
}

struct RankedCandidate<'c> {
    dish: &'c Dish,
    verdict_sum: i32,
    variety_penalty: f64,
    preference: f64,
}

/// Composes a day's plan for a household.
///
/// Per slot: the catalog is hard-gated through the allergy filter per
/// member, a unified dish is sought in the intersection of every opted-in
/// member's safe subset, and survivors are soft-ranked by aggregated disease
/// verdict, then lowest combined variety penalty, then preference matches.
/// When the intersection is empty every member falls back to an individual
/// assignment. Catalog I/O, retries, and persistence belong to external
/// collaborators; composition over an empty catalog terminates the affected
/// slot as unassignable without aborting the rest.
pub struct FamilyPlanReconciler<'a> {
    filter: AllergySafetyFilter<'a>,
    scorer: DiseaseConstraintScorer<'a>,
}

impl<'a> FamilyPlanReconciler<'a> {
    pub fn new(allergy_catalog: &'a AllergyCatalog, rules: &'a DiseaseRuleSet) -> Self {
        FamilyPlanReconciler {
            filter: AllergySafetyFilter::new(allergy_catalog),
            scorer: DiseaseConstraintScorer::new(rules),
        }
    }

    pub fn allergy_filter(&self) -> &AllergySafetyFilter<'a> {
        &self.filter
    }

    /// Compose one date's assignments for every requested slot.
    ///
    /// `date` is a `%Y-%m-%d` string as supplied by the caller. `seed`
    /// makes tie-shuffling among equally ranked candidates reproducible;
    /// without it the shuffle is seeded from the clock.
    pub fn compose(
        &self,
        members: &[Member],
        catalog: &[Dish],
        date: &str,
        slots: &[SlotPlan],
        tracker: &mut VarietyTracker,
        seed: Option<u64>,
    ) -> Result<Vec<SlotOutcome>, DietPlanningError> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| DietPlanningError::InvalidDate(e.to_string()))?;

        let active: Vec<&Member> = members.iter().filter(|m| m.active).collect();
        if active.is_empty() {
            return Err(DietPlanningError::EmptyHousehold);
        }

        if self.filter.ensure_reference().is_err() {
            tracing::warn!(%date, "composing with unavailable allergy reference; all allergic members fail closed");
        }

        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => {
                use std::time::{SystemTime, UNIX_EPOCH};
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                StdRng::seed_from_u64(now)
            }
        };

        let mut outcomes = Vec::new();
        for plan in slots {
            self.compose_slot(&active, catalog, date, plan, tracker, &mut rng, &mut outcomes);
        }
        Ok(outcomes)
    }

    #[allow(clippy::too_many_arguments)]
    fn compose_slot(
        &self,
        active: &[&Member],
        catalog: &[Dish],
        date: NaiveDate,
        plan: &SlotPlan,
        tracker: &mut VarietyTracker,
        rng: &mut StdRng,
        outcomes: &mut Vec<SlotOutcome>,
    ) {
        let unified_members: Vec<&Member> = active
            .iter()
            .copied()
            .filter(|m| m.include_in_unified_plan)
            .collect();

        let mut unified_assigned = false;
        if !unified_members.is_empty() {
            if let Some(meal) =
                self.try_compose_meal(&unified_members, true, catalog, date, plan, tracker, rng)
            {
                let rationale = self.rationale(&meal, &unified_members, date, plan.slot, tracker);
                for dish in meal.dishes() {
                    tracker.record_usage(PlanScope::Household, dish.id.clone(), date);
                }
                outcomes.push(SlotOutcome::Assigned(PlanAssignment {
                    id: Uuid::new_v4().to_string(),
                    date,
                    slot: plan.slot,
                    scope: PlanScope::Household,
                    meal,
                    rationale,
                    is_unified: true,
                }));
                unified_assigned = true;
            } else {
                tracing::debug!(
                    %date,
                    slot = %plan.slot,
                    "no unified candidate across household; falling back to individual meals"
                );
            }
        }

        // Members outside the unified plan always get an individual meal;
        // opted-in members do too when no unified dish exists.
        for member in active {
            if member.include_in_unified_plan && unified_assigned {
                continue;
            }
            let signal = [*member];
            match self.try_compose_meal(&signal, false, catalog, date, plan, tracker, rng) {
                Some(meal) => {
                    let rationale = self.rationale(&meal, &signal, date, plan.slot, tracker);
                    let scope = PlanScope::Member(member.id.clone());
                    for dish in meal.dishes() {
                        tracker.record_usage(scope.clone(), dish.id.clone(), date);
                    }
                    outcomes.push(SlotOutcome::Assigned(PlanAssignment {
                        id: Uuid::new_v4().to_string(),
                        date,
                        slot: plan.slot,
                        scope,
                        meal,
                        rationale,
                        is_unified: false,
                    }));
                }
                None => {
                    outcomes.push(SlotOutcome::Unassignable {
                        date,
                        slot: plan.slot,
                        scope: PlanScope::Member(member.id.clone()),
                        reason: format!(
                            "no allergy-safe dish in the catalog for {}",
                            member.display_name
                        ),
                    });
                }
            }
        }
    }

    /// Build a meal for the given signal members, or `None` when no safe
    /// candidate exists in any required partition.
    #[allow(clippy::too_many_arguments)]
    fn try_compose_meal(
        &self,
        signal: &[&Member],
        unified: bool,
        catalog: &[Dish],
        date: NaiveDate,
        plan: &SlotPlan,
        tracker: &VarietyTracker,
        rng: &mut StdRng,
    ) -> Option<AssignedMeal> {
        match plan.style {
            MealStyle::Single => {
                let candidates = self.safe_partition(catalog, DishRole::Standalone, signal);
                let ranked = self.rank(candidates, signal, unified, date, tracker, rng);
                ranked.first().map(|top| AssignedMeal::Single {
                    dish: top.dish.clone(),
                })
            }
            MealStyle::Composite { side_count } => {
                let staple = self
                    .rank(
                        self.safe_partition(catalog, DishRole::Staple, signal),
                        signal,
                        unified,
                        date,
                        tracker,
                        rng,
                    )
                    .first()
                    .map(|c| c.dish.clone());

                let mut sides = Vec::new();
                let side_ranked = self.rank(
                    self.safe_partition(catalog, DishRole::Side, signal),
                    signal,
                    unified,
                    date,
                    tracker,
                    rng,
                );
                for candidate in side_ranked.iter().take(side_count) {
                    sides.push(candidate.dish.clone());
                }

                let soup = self
                    .rank(
                        self.safe_partition(catalog, DishRole::Soup, signal),
                        signal,
                        unified,
                        date,
                        tracker,
                        rng,
                    )
                    .first()
                    .map(|c| c.dish.clone());

                let meal = AssignedMeal::Composite {
                    staple,
                    sides,
                    soup,
                };
                if meal.is_empty() {
                    None
                } else {
                    Some(meal)
                }
            }
        }
    }

    /// The role partition of the catalog, hard-gated through every signal
    /// member's allergy filter. The gate is the intersection: a dish
    /// survives only if safe for all of them.
    fn safe_partition<'c>(
        &self,
        catalog: &'c [Dish],
        role: DishRole,
        signal: &[&Member],
    ) -> Vec<&'c Dish> {
        catalog
            .iter()
            .filter(|dish| dish.role == role)
            .filter(|dish| {
                signal
                    .iter()
                    .all(|member| self.filter.is_safe(dish, &member.allergies).safe)
            })
            .collect()
    }

    /// Soft-rank safe candidates. Strictly lexicographic: aggregated disease
    /// verdict first, then lowest combined variety penalty, then
    /// rank-weighted preference score. Equal candidates keep their shuffled
    /// order so seeded runs vary ties reproducibly.
    fn rank<'c>(
        &self,
        candidates: Vec<&'c Dish>,
        signal: &[&Member],
        unified: bool,
        date: NaiveDate,
        tracker: &VarietyTracker,
        rng: &mut StdRng,
    ) -> Vec<RankedCandidate<'c>> {
        let mut shuffled = candidates;
        shuffled.shuffle(rng);

        let mut ranked: Vec<RankedCandidate<'c>> = shuffled
            .into_iter()
            .map(|dish| {
                let verdict_sum: i32 = signal
                    .iter()
                    .map(|m| self.scorer.score(&dish.nutrients, &m.diseases).verdict.rank())
                    .sum();

                let mut variety_penalty = 0.0;
                if unified {
                    variety_penalty += tracker.penalty(&dish.id, &PlanScope::Household, date);
                }
                for member in signal {
                    variety_penalty +=
                        tracker.penalty(&dish.id, &PlanScope::Member(member.id.clone()), date);
                }

                let corpus = dish.text_corpus();
                let preference: f64 = signal
                    .iter()
                    .map(|m| Self::preference_score(m, &corpus))
                    .sum();

                RankedCandidate {
                    dish,
                    verdict_sum,
                    variety_penalty,
                    preference,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.verdict_sum
                .cmp(&a.verdict_sum)
                .then(
                    a.variety_penalty
                        .partial_cmp(&b.variety_penalty)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(
                    b.preference
                        .partial_cmp(&a.preference)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });
        ranked
    }

    /// Rank-weighted preference signal: earlier entries in the member's
    /// lists weigh more; preferred names boost, excluded names penalize.
    fn preference_score(member: &Member, corpus: &str) -> f64 {
        let mut score = 0.0;
        let preferred_len = member.preferred_ingredients.len();
        for (i, name) in member.preferred_ingredients.iter().enumerate() {
            if corpus.contains(&name.to_lowercase()) {
                score += (preferred_len - i) as f64;
            }
        }
        let excluded_len = member.excluded_ingredients.len();
        for (i, name) in member.excluded_ingredients.iter().enumerate() {
            if corpus.contains(&name.to_lowercase()) {
                score -= (excluded_len - i) as f64;
            }
        }
        score
    }

    /// Human-readable assignment rationale, most specific signal first.
    fn rationale(
        &self,
        meal: &AssignedMeal,
        signal: &[&Member],
        date: NaiveDate,
        slot: MealSlotKind,
        tracker: &VarietyTracker,
    ) -> String {
        let mut findings = Vec::new();
        for dish in meal.dishes() {
            for member in signal {
                let score: DishScore = self.scorer.score(&dish.nutrients, &member.diseases);
                findings.extend(score.findings);
            }
        }

        let mut text = if let Some(warning) = findings.iter().find(|f| f.kind == FindingKind::Warning)
        {
            format!("Best safe option for {slot}; note: {}", warning.message)
        } else if let Some(improvement) = findings
            .iter()
            .find(|f| f.kind == FindingKind::Improvement)
        {
            format!("Good fit for {slot}: {}", improvement.message)
        } else {
            let fresh = meal.dishes().iter().all(|dish| {
                let household = tracker.penalty(&dish.id, &PlanScope::Household, date);
                household == 0.0
            });
            if fresh {
                format!(
                    "Safe choice for {slot}, not served in the last {} days",
                    tracker.lookback_days()
                )
            } else {
                format!("Best safe fit for {slot} on {date}")
            }
        };

        if signal.iter().any(|m| m.has_allergies()) {
            text.push_str(" (ingredient information may vary — verify before eating)");
        }
        text
    }
}
