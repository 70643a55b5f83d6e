use thiserror::Error;

#[derive(Error, Debug)]
pub enum DietPlanningError {
    #[error("allergy reference data is unavailable; composition fails closed")]
    SafetyReferenceUnavailable,

    #[error("household has no active members to plan for")]
    EmptyHousehold,

    #[error("invalid plan date: {0}")]
    InvalidDate(String),
}
