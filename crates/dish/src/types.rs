use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

/// Structured nutrient facts for one dish, as supplied by the catalog.
///
/// Required fields may still arrive negative from upstream data entry;
/// optional fields may be absent entirely. All reads for scoring and
/// aggregation go through the `*_or_zero` accessors, which clamp missing or
/// negative values to zero so a bad record degrades a score instead of
/// poisoning a total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientFacts {
    pub calories: f64,
    pub protein_g: f64,
    pub carbohydrate_g: f64,
    pub fat_g: f64,
    pub sodium_mg: f64,
    #[serde(default)]
    pub potassium_mg: Option<f64>,
    #[serde(default)]
    pub phosphorus_mg: Option<f64>,
    #[serde(default)]
    pub fiber_g: Option<f64>,
    #[serde(default)]
    pub glycemic_index: Option<f64>,
}

fn clamped(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

impl NutrientFacts {
    pub fn calories_or_zero(&self) -> f64 {
        clamped(self.calories)
    }

    pub fn protein_or_zero(&self) -> f64 {
        clamped(self.protein_g)
    }

    pub fn carbohydrate_or_zero(&self) -> f64 {
        clamped(self.carbohydrate_g)
    }

    pub fn fat_or_zero(&self) -> f64 {
        clamped(self.fat_g)
    }

    pub fn sodium_or_zero(&self) -> f64 {
        clamped(self.sodium_mg)
    }

    pub fn potassium_or_zero(&self) -> f64 {
        clamped(self.potassium_mg.unwrap_or(0.0))
    }

    pub fn phosphorus_or_zero(&self) -> f64 {
        clamped(self.phosphorus_mg.unwrap_or(0.0))
    }

    pub fn fiber_or_zero(&self) -> f64 {
        clamped(self.fiber_g.unwrap_or(0.0))
    }

    /// Glycemic index has no meaningful zero, so absence stays `None`.
    pub fn glycemic_index_clamped(&self) -> Option<f64> {
        self.glycemic_index.filter(|gi| gi.is_finite() && *gi > 0.0)
    }

    /// Fraction of calories coming from fat, in percent. `None` when the
    /// dish reports no calories (the ratio is undefined, not zero).
    pub fn fat_calorie_fraction(&self) -> Option<f64> {
        let calories = self.calories_or_zero();
        if calories <= 0.0 {
            return None;
        }
        Some(self.fat_or_zero() * 9.0 / calories * 100.0)
    }
}

/// Which position in a composite meal a dish can fill. `Standalone` dishes
/// are complete meals on their own and are what simple slots draw from.
#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DishRole {
    #[default]
    Standalone,
    Staple,
    Side,
    Soup,
}

/// A published dish. Immutable once published — a revised recipe gets a new
/// identity, which is what keeps historical plan assignments stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dish {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<String>,
    pub seasonings: Vec<String>,
    pub role: DishRole,
    pub nutrients: NutrientFacts,
}

impl Dish {
    /// The lowercase text corpus the allergy filter and preference matcher
    /// scan: dish name, every ingredient line, every sauce/seasoning line.
    pub fn text_corpus(&self) -> String {
        let mut corpus = self.name.to_lowercase();
        for part in self.ingredients.iter().chain(self.seasonings.iter()) {
            corpus.push('\n');
            corpus.push_str(&part.to_lowercase());
        }
        corpus
    }
}

/// What actually got assigned to a slot: either a single dish or a composite
/// meal with staple/side/soup positions. Every sub-role position holds
/// exactly one dish or is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssignedMeal {
    Single { dish: Dish },
    Composite {
        staple: Option<Dish>,
        sides: Vec<Dish>,
        soup: Option<Dish>,
    },
}

impl AssignedMeal {
    /// Flattened view over every constituent dish, uniform across both
    /// variants. Ranking, safety re-checks, and nutrition rollups all
    /// operate on this.
    pub fn dishes(&self) -> Vec<&Dish> {
        match self {
            AssignedMeal::Single { dish } => vec![dish],
            AssignedMeal::Composite {
                staple,
                sides,
                soup,
            } => staple
                .iter()
                .chain(sides.iter())
                .chain(soup.iter())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dishes().is_empty()
    }
}
