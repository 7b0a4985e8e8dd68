//! Commission computation policies.
//!
//! The upstream product describes referral commissions two incompatible
//! ways: a flat fixed bonus per qualified referral in one place, and a
//! percentage of the referred user's transaction volume in another. Until
//! product picks one, both ship as named policies behind a single trait and
//! config selects which one runs. Nothing in the engine silently prefers
//! either.

use super::types::ReferralEarning;

/// Computes the one-time bonus credited when an earning qualifies.
pub trait CommissionPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Bonus in kobo for a record that just crossed the threshold.
    fn qualification_bonus(&self, earning: &ReferralEarning) -> u64;
}

/// Flat bonus per qualified referral, independent of volume.
pub struct FixedBonus {
    pub amount_kobo: u64,
}

impl CommissionPolicy for FixedBonus {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn qualification_bonus(&self, _earning: &ReferralEarning) -> u64 {
        self.amount_kobo
    }
}

/// Percentage of the referred user's cumulative completed volume, in basis
/// points (50 bps = 0.5%).
pub struct PercentOfVolume {
    pub rate_bps: u32,
}

impl CommissionPolicy for PercentOfVolume {
    fn name(&self) -> &'static str {
        "percent"
    }

    fn qualification_bonus(&self, earning: &ReferralEarning) -> u64 {
        // u128 intermediate: volume * bps cannot overflow
        (earning.total_volume_kobo as u128 * self.rate_bps as u128 / 10_000) as u64
    }
}
