use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
pub enum MemberRole {
    /// The household owner's own profile.
    #[default]
    #[strum(serialize = "self")]
    #[serde(rename = "self")]
    SelfMember,
    #[strum(serialize = "dependent")]
    #[serde(rename = "dependent")]
    Dependent,
}

/// Severity class of an allergy. Ordering is medical priority:
/// `Moderate < High < Critical`.
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
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AllergySeverity {
    Moderate,
    High,
    Critical,
}

/// A household member's health profile as supplied by the member store.
///
/// Disease and allergy fields hold reference codes, not display names; the
/// preference lists are ranked (earlier entries matter more). Members are
/// never hard-deleted while referenced by historical plans — `active = false`
/// is the soft-deactivate state and inactive members are skipped during
/// composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub display_name: String,
    pub role: MemberRole,
    pub diseases: Vec<String>,
    pub allergies: Vec<String>,
    pub preferred_ingredients: Vec<String>,
    pub excluded_ingredients: Vec<String>,
    pub include_in_unified_plan: bool,
    pub active: bool,
}

impl Member {
    /// New active member with empty health profile, opted into the unified
    /// plan.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: MemberRole) -> Self {
        Member {
            id: id.into(),
            display_name: display_name.into(),
            role,
            diseases: Vec::new(),
            allergies: Vec::new(),
            preferred_ingredients: Vec::new(),
            excluded_ingredients: Vec::new(),
            include_in_unified_plan: true,
            active: true,
        }
    }

    pub fn has_allergies(&self) -> bool {
        !self.allergies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(AllergySeverity::Critical > AllergySeverity::High);
        assert!(AllergySeverity::High > AllergySeverity::Moderate);
        assert_eq!(
            [AllergySeverity::High, AllergySeverity::Critical]
                .iter()
                .max(),
            Some(&AllergySeverity::Critical)
        );
    }

    #[test]
    fn test_member_role_serde_names() {
        let json = serde_json::to_string(&MemberRole::SelfMember).unwrap();
        assert_eq!(json, "\"self\"");
        let role: MemberRole = serde_json::from_str("\"dependent\"").unwrap();
        assert_eq!(role, MemberRole::Dependent);
    }

    #[test]
    fn test_new_member_defaults() {
        let member = Member::new("m1", "Alice", MemberRole::SelfMember);
        assert!(member.active);
        assert!(member.include_in_unified_plan);
        assert!(!member.has_allergies());
    }
}
