pub mod types;

pub use types::{AssignedMeal, Dish, DishRole, NutrientFacts};
