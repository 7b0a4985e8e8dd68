//! Referral earning records and the derived tier table.

use serde::{Deserialize, Serialize};

use crate::core_types::{EarningId, UserId};

/// Qualification lifecycle. Only one transition exists:
/// `Pending -> Qualified`, taken exactly once per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationStatus {
    Pending,
    Qualified,
}

/// Per-referred-user earning record owned by the referrer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralEarning {
    pub id: EarningId,
    pub referrer: UserId,
    pub referred_user: UserId,
    pub referred_name: String,
    /// Completed transactions by the referred user.
    pub transaction_count: u32,
    /// Cumulative fiat volume of those transactions, in kobo. Input to the
    /// percent-of-volume commission policy.
    pub total_volume_kobo: u64,
    pub status: QualificationStatus,
    /// Bonus credited at qualification. Zero until qualified.
    pub bonus_kobo: u64,
    /// Unix millis.
    pub referred_at: i64,
    /// Set only when qualified.
    pub qualified_at: Option<i64>,
}

impl ReferralEarning {
    pub fn new(referrer: UserId, referred_user: UserId, referred_name: impl Into<String>) -> Self {
        Self {
            id: EarningId::new(),
            referrer,
            referred_user,
            referred_name: referred_name.into(),
            transaction_count: 0,
            total_volume_kobo: 0,
            status: QualificationStatus::Pending,
            bonus_kobo: 0,
            referred_at: chrono::Utc::now().timestamp_millis(),
            qualified_at: None,
        }
    }
}

/// Read-only tier derived from the cumulative qualified-referral count.
/// Never persisted; recomputed on read against a fixed threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralTier {
    Starter,
    Bronze,
    Silver,
    Gold,
}

/// Minimum qualified referrals for each tier.
const TIER_TABLE: [(u32, ReferralTier); 4] = [
    (30, ReferralTier::Gold),
    (15, ReferralTier::Silver),
    (5, ReferralTier::Bronze),
    (0, ReferralTier::Starter),
];

impl ReferralTier {
    pub fn for_qualified_count(count: u32) -> Self {
        TIER_TABLE
            .iter()
            .find(|(min, _)| count >= *min)
            .map(|(_, tier)| *tier)
            .unwrap_or(ReferralTier::Starter)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralTier::Starter => "starter",
            ReferralTier::Bronze => "bronze",
            ReferralTier::Silver => "silver",
            ReferralTier::Gold => "gold",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(ReferralTier::for_qualified_count(0), ReferralTier::Starter);
        assert_eq!(ReferralTier::for_qualified_count(4), ReferralTier::Starter);
        assert_eq!(ReferralTier::for_qualified_count(5), ReferralTier::Bronze);
        assert_eq!(ReferralTier::for_qualified_count(14), ReferralTier::Bronze);
        assert_eq!(ReferralTier::for_qualified_count(15), ReferralTier::Silver);
        assert_eq!(ReferralTier::for_qualified_count(30), ReferralTier::Gold);
        assert_eq!(ReferralTier::for_qualified_count(1000), ReferralTier::Gold);
    }

    #[test]
    fn test_new_earning_is_pending() {
        let e = ReferralEarning::new(100, 1, "Ada Obi");
        assert_eq!(e.status, QualificationStatus::Pending);
        assert_eq!(e.transaction_count, 0);
        assert_eq!(e.bonus_kobo, 0);
        assert!(e.qualified_at.is_none());
    }
}
