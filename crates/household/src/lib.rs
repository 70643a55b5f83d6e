pub mod allergy;
pub mod types;

pub use allergy::{AllergyCatalog, AllergyEntry};
pub use types::{AllergySeverity, Member, MemberRole};
