//! Referral qualification engine
//!
//! Derives earning records from referred-user transaction counts, flips
//! them to qualified at the threshold, and credits the referrer through the
//! ledger. The commission amount comes from a swappable policy because the
//! upstream product defines it two incompatible ways.

mod commission;
mod engine;
mod types;

pub use commission::{CommissionPolicy, FixedBonus, PercentOfVolume};
pub use engine::{ReferralEngine, ReferralError};
pub use types::{QualificationStatus, ReferralEarning, ReferralTier};
