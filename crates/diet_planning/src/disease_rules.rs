use hearthplate_dish::NutrientFacts;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{AsRefStr, Display};

/// Nutrient dimensions the rule table can threshold on.
///
/// `FatCalorieFraction` is computed (fat grams × 9 / calories, in percent)
/// and is undefined for dishes reporting zero calories — rules over it are
/// skipped for such dishes rather than read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    CarbohydrateG,
    GlycemicIndex,
    ProteinG,
    SodiumMg,
    PotassiumMg,
    PhosphorusMg,
    FatCalorieFraction,
}

impl Nutrient {
    /// Read this dimension out of a nutrient-facts record. Missing and
    /// negative raw values read as zero; computed and optional dimensions
    /// with no defined value read as `None` and skip their rules.
    pub fn read(&self, facts: &NutrientFacts) -> Option<f64> {
        match self {
            Nutrient::CarbohydrateG => Some(facts.carbohydrate_or_zero()),
            Nutrient::GlycemicIndex => facts.glycemic_index_clamped(),
            Nutrient::ProteinG => Some(facts.protein_or_zero()),
            Nutrient::SodiumMg => Some(facts.sodium_or_zero()),
            Nutrient::PotassiumMg => Some(facts.potassium_or_zero()),
            Nutrient::PhosphorusMg => Some(facts.phosphorus_or_zero()),
            Nutrient::FatCalorieFraction => facts.fat_calorie_fraction(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Nutrient::CarbohydrateG => "carbohydrate (g)",
            Nutrient::GlycemicIndex => "glycemic index",
            Nutrient::ProteinG => "protein (g)",
            Nutrient::SodiumMg => "sodium (mg)",
            Nutrient::PotassiumMg => "potassium (mg)",
            Nutrient::PhosphorusMg => "phosphorus (mg)",
            Nutrient::FatCalorieFraction => "share of calories from fat (%)",
        }
    }
}

/// One threshold row: warn above a ceiling, credit an improvement below a
/// floor. Either bound may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientRule {
    pub nutrient: Nutrient,
    pub warn_above: Option<f64>,
    pub improve_below: Option<f64>,
}

impl NutrientRule {
    fn new(nutrient: Nutrient, warn_above: Option<f64>, improve_below: Option<f64>) -> Self {
        NutrientRule {
            nutrient,
            warn_above,
            improve_below,
        }
    }
}

/// Dish verdict for a member's disease profile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Positive,
    Warning,
    Neutral,
}

impl Verdict {
    /// Ranking value for candidate ordering: positive > neutral > warning.
    pub fn rank(&self) -> i32 {
        match self {
            Verdict::Positive => 2,
            Verdict::Neutral => 1,
            Verdict::Warning => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Warning,
    Improvement,
}

/// One matched rule row, with the disease it came from kept visible — each
/// disease has an independent medical rationale, so findings are
/// concatenated across diseases and never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseFinding {
    pub disease: String,
    pub nutrient: Nutrient,
    pub kind: FindingKind,
    pub message: String,
}

/// Scoring result for one dish against one member's disease profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishScore {
    pub verdict: Verdict,
    pub findings: Vec<DiseaseFinding>,
}

impl DishScore {
    pub fn neutral() -> Self {
        DishScore {
            verdict: Verdict::Neutral,
            findings: Vec::new(),
        }
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiseaseFinding> {
        self.findings
            .iter()
            .filter(|f| f.kind == FindingKind::Warning)
    }

    pub fn improvements(&self) -> impl Iterator<Item = &DiseaseFinding> {
        self.findings
            .iter()
            .filter(|f| f.kind == FindingKind::Improvement)
    }
}

/// Enumerable disease → threshold-rule mapping. Adding a disease is a data
/// change here, not a control-flow change anywhere else. Injected so tests
/// and locales can swap tables without touching call sites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiseaseRuleSet {
    rules: HashMap<String, Vec<NutrientRule>>,
}

impl DiseaseRuleSet {
    pub fn new(rules: HashMap<String, Vec<NutrientRule>>) -> Self {
        DiseaseRuleSet { rules }
    }

    /// The built-in clinical threshold table.
    pub fn standard() -> Self {
        use Nutrient::*;

        let mut rules: HashMap<String, Vec<NutrientRule>> = HashMap::new();
        rules.insert(
            "diabetes".to_string(),
            vec![
                NutrientRule::new(CarbohydrateG, Some(60.0), Some(30.0)),
                NutrientRule::new(GlycemicIndex, Some(70.0), Some(55.0)),
            ],
        );
        rules.insert(
            "kidney_disease".to_string(),
            vec![
                NutrientRule::new(ProteinG, Some(30.0), Some(20.0)),
                NutrientRule::new(SodiumMg, Some(1000.0), Some(500.0)),
                NutrientRule::new(PotassiumMg, Some(500.0), None),
                NutrientRule::new(PhosphorusMg, Some(300.0), None),
            ],
        );
        let cardiovascular = vec![
            NutrientRule::new(SodiumMg, Some(1000.0), Some(500.0)),
            NutrientRule::new(FatCalorieFraction, Some(35.0), Some(25.0)),
        ];
        // Hypertension shares the cardiovascular thresholds; both codes
        // appear in member profiles.
        rules.insert("hypertension".to_string(), cardiovascular.clone());
        rules.insert("cardiovascular".to_string(), cardiovascular);
        rules.insert(
            "gout".to_string(),
            vec![NutrientRule::new(ProteinG, Some(30.0), None)],
        );
        rules.insert(
            "gastritis".to_string(),
            vec![NutrientRule::new(SodiumMg, Some(1000.0), None)],
        );

        DiseaseRuleSet::new(rules)
    }

    pub fn rules_for(&self, disease_code: &str) -> Option<&[NutrientRule]> {
        self.rules.get(disease_code).map(Vec::as_slice)
    }
}

/// Scores a dish's nutrient profile against a member's diseases.
///
/// This is a soft ranking signal, explicitly weaker than the allergy gate:
/// diseases shift recommended proportions, allergies are medically absolute.
/// It never blocks a dish, and unknown disease codes are a data-quality
/// warning, not an error.
pub struct DiseaseConstraintScorer<'a> {
    rules: &'a DiseaseRuleSet,
}

impl<'a> DiseaseConstraintScorer<'a> {
    pub fn new(rules: &'a DiseaseRuleSet) -> Self {
        DiseaseConstraintScorer { rules }
    }

    pub fn score(&self, nutrients: &NutrientFacts, disease_codes: &[String]) -> DishScore {
        let mut findings = Vec::new();
        let mut any_warning = false;
        let mut any_improvement = false;

        for code in disease_codes {
            let Some(disease_rules) = self.rules.rules_for(code) else {
                tracing::warn!(disease_code = %code, "unknown disease code in member profile");
                continue;
            };

            for rule in disease_rules {
                let Some(value) = rule.nutrient.read(nutrients) else {
                    continue;
                };

                if let Some(ceiling) = rule.warn_above {
                    if value > ceiling {
                        findings.push(DiseaseFinding {
                            disease: code.clone(),
                            nutrient: rule.nutrient,
                            kind: FindingKind::Warning,
                            message: format!(
                                "{}: {} of {:.0} is above the {:.0} ceiling",
                                code,
                                rule.nutrient.label(),
                                value,
                                ceiling
                            ),
                        });
                        any_warning = true;
                        continue;
                    }
                }

                if let Some(floor) = rule.improve_below {
                    if value < floor {
                        findings.push(DiseaseFinding {
                            disease: code.clone(),
                            nutrient: rule.nutrient,
                            kind: FindingKind::Improvement,
                            message: format!(
                                "{}: {} of {:.0} is comfortably under {:.0}",
                                code,
                                rule.nutrient.label(),
                                value,
                                floor
                            ),
                        });
                        any_improvement = true;
                    }
                }
            }
        }

        let verdict = if any_warning {
            Verdict::Warning
        } else if any_improvement {
            Verdict::Positive
        } else {
            Verdict::Neutral
        };

        DishScore { verdict, findings }
    }
}
