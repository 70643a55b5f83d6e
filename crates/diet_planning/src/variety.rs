use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Who a usage record or plan assignment belongs to: one member's own meals,
/// or the shared household (unified) meal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "member_id", rename_all = "snake_case")]
pub enum PlanScope {
    Member(String),
    Household,
}

/// Append-only record of a dish being served under a scope on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub scope: PlanScope,
    pub dish_id: String,
    pub used_on: NaiveDate,
}

/// Tracks recently-served dishes and penalizes repeats.
///
/// The penalty is a soft ranking signal in `[0, 1]`, proportional to
/// recency: a dish served yesterday scores the full 1.0, one at the edge of
/// the lookback window scores near 0, a dish never seen scores 0. It is
/// never a hard filter — with a thin catalog where everything was served
/// recently, the least-recently-used dish still ranks finite and selectable.
///
/// State round-trips through JSON so a collaborator can persist it between
/// composition runs, the same way rotation state is stored upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarietyTracker {
    records: Vec<UsageRecord>,
    lookback_days: i64,
}

impl VarietyTracker {
    pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

    pub fn new(lookback_days: i64) -> Self {
        VarietyTracker {
            records: Vec::new(),
            // A non-positive window would make every penalty degenerate.
            lookback_days: lookback_days.max(1),
        }
    }

    pub fn with_records(lookback_days: i64, records: Vec<UsageRecord>) -> Self {
        let mut tracker = Self::new(lookback_days);
        tracker.records = records;
        tracker
    }

    pub fn lookback_days(&self) -> i64 {
        self.lookback_days
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    /// Append one usage record. Records are never updated or removed here;
    /// pruning old history is the storage collaborator's concern.
    pub fn record_usage(&mut self, scope: PlanScope, dish_id: impl Into<String>, used_on: NaiveDate) {
        self.records.push(UsageRecord {
            scope,
            dish_id: dish_id.into(),
            used_on,
        });
    }

    /// Recency penalty for serving `dish_id` under `scope` on `today`.
    pub fn penalty(&self, dish_id: &str, scope: &PlanScope, today: NaiveDate) -> f64 {
        let most_recent = self
            .records
            .iter()
            .filter(|r| r.scope == *scope && r.dish_id == dish_id)
            .map(|r| r.used_on)
            .max();

        let Some(used_on) = most_recent else {
            return 0.0;
        };

        // Same-day or stale-future records count as "yesterday": full
        // penalty rather than a negative age.
        let days_ago = (today - used_on).num_days().max(1);
        if days_ago > self.lookback_days {
            return 0.0;
        }

        (self.lookback_days + 1 - days_ago) as f64 / self.lookback_days as f64
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for VarietyTracker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LOOKBACK_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, day).unwrap()
    }

    #[test]
    fn test_unseen_dish_has_zero_penalty() {
        let tracker = VarietyTracker::default();
        assert_eq!(
            tracker.penalty("dish-1", &PlanScope::Household, date(20)),
            0.0
        );
    }

    #[test]
    fn test_yesterday_scores_full_penalty() {
        let mut tracker = VarietyTracker::default();
        tracker.record_usage(PlanScope::Household, "dish-1", date(19));

        assert_eq!(
            tracker.penalty("dish-1", &PlanScope::Household, date(20)),
            1.0
        );
    }

    #[test]
    fn test_penalty_decays_toward_window_edge() {
        let mut tracker = VarietyTracker::new(7);
        tracker.record_usage(PlanScope::Household, "dish-1", date(13)); // 7 days ago

        let edge = tracker.penalty("dish-1", &PlanScope::Household, date(20));
        assert!(edge > 0.0 && edge < 0.2, "edge penalty should be near zero, got {}", edge);

        let mut fresher = VarietyTracker::new(7);
        fresher.record_usage(PlanScope::Household, "dish-1", date(17)); // 3 days ago
        let mid = fresher.penalty("dish-1", &PlanScope::Household, date(20));
        assert!(mid > edge);
    }

    #[test]
    fn test_outside_window_is_free() {
        let mut tracker = VarietyTracker::new(7);
        tracker.record_usage(PlanScope::Household, "dish-1", date(10)); // 10 days ago

        assert_eq!(
            tracker.penalty("dish-1", &PlanScope::Household, date(20)),
            0.0
        );
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut tracker = VarietyTracker::default();
        tracker.record_usage(PlanScope::Member("alice".to_string()), "dish-1", date(19));

        assert_eq!(
            tracker.penalty("dish-1", &PlanScope::Household, date(20)),
            0.0
        );
        assert_eq!(
            tracker.penalty(
                "dish-1",
                &PlanScope::Member("alice".to_string()),
                date(20)
            ),
            1.0
        );
    }

    #[test]
    fn test_most_recent_usage_wins() {
        let mut tracker = VarietyTracker::new(7);
        tracker.record_usage(PlanScope::Household, "dish-1", date(13));
        tracker.record_usage(PlanScope::Household, "dish-1", date(19));

        assert_eq!(
            tracker.penalty("dish-1", &PlanScope::Household, date(20)),
            1.0
        );
    }

    #[test]
    fn test_json_round_trip() {
        let mut tracker = VarietyTracker::new(14);
        tracker.record_usage(PlanScope::Household, "dish-1", date(19));
        tracker.record_usage(PlanScope::Member("alice".to_string()), "dish-2", date(18));

        let json = tracker.to_json().unwrap();
        let restored = VarietyTracker::from_json(&json).unwrap();

        assert_eq!(restored.lookback_days(), 14);
        assert_eq!(restored.records(), tracker.records());
        assert_eq!(
            restored.penalty("dish-1", &PlanScope::Household, date(20)),
            1.0
        );
    }
}
