//! ReferralEngine - qualification bookkeeping.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::info;

use super::commission::{CommissionPolicy, FixedBonus, PercentOfVolume};
use super::types::{QualificationStatus, ReferralEarning, ReferralTier};
use crate::audit::{AuditTrail, EntityKind};
use crate::config::EngineConfig;
use crate::core_types::{EarningId, UserId};
use crate::ledger::{LedgerError, LedgerStore};
use crate::money::format_kobo;

/// Referral operation errors
#[derive(Debug, Error)]
pub enum ReferralError {
    #[error("User {0} is already referred")]
    AlreadyReferred(UserId),

    #[error("Earning record not found: {0}")]
    NotFound(EarningId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ReferralError {
    pub fn code(&self) -> &'static str {
        match self {
            ReferralError::AlreadyReferred(_) => "ALREADY_REFERRED",
            ReferralError::NotFound(_) => "EARNING_NOT_FOUND",
            ReferralError::Ledger(_) => "LEDGER_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ReferralError::AlreadyReferred(_) => 409,
            ReferralError::NotFound(_) => 404,
            ReferralError::Ledger(_) => 500,
        }
    }
}

/// Tracks one earning record per referred user and qualifies it when the
/// completed-transaction count crosses the threshold.
pub struct ReferralEngine {
    earnings: DashMap<EarningId, ReferralEarning>,
    by_referred: DashMap<UserId, EarningId>,
    by_referrer: DashMap<UserId, Vec<EarningId>>,
    ledger: Arc<LedgerStore>,
    audit: Arc<AuditTrail>,
    policy: Box<dyn CommissionPolicy>,
    qualification_threshold: u32,
}

impl ReferralEngine {
    pub fn new(ledger: Arc<LedgerStore>, audit: Arc<AuditTrail>, config: &EngineConfig) -> Self {
        let policy: Box<dyn CommissionPolicy> = match config.commission_model.as_str() {
            "percent" => Box::new(PercentOfVolume {
                rate_bps: config.commission_rate_bps,
            }),
            // "fixed" and anything unrecognized: the flat bonus
            _ => Box::new(FixedBonus {
                amount_kobo: config.referral_bonus_kobo,
            }),
        };
        Self {
            earnings: DashMap::new(),
            by_referred: DashMap::new(),
            by_referrer: DashMap::new(),
            ledger,
            audit,
            policy,
            qualification_threshold: config.qualification_threshold,
        }
    }

    /// Create the pending earning record at referred-signup time. A user
    /// can only be referred once.
    pub fn register_referral(
        &self,
        referrer: UserId,
        referred_user: UserId,
        referred_name: &str,
    ) -> Result<ReferralEarning, ReferralError> {
        // entry guard on by_referred makes the duplicate check atomic
        let entry = self.by_referred.entry(referred_user);
        let entry = match entry {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(ReferralError::AlreadyReferred(referred_user));
            }
            dashmap::mapref::entry::Entry::Vacant(v) => v,
        };

        let earning = ReferralEarning::new(referrer, referred_user, referred_name);
        entry.insert(earning.id);
        self.by_referrer.entry(referrer).or_default().push(earning.id);
        self.earnings.insert(earning.id, earning.clone());

        info!(
            earning_id = %earning.id,
            referrer,
            referred_user,
            "referral registered"
        );
        self.audit.record(
            EntityKind::Earning,
            &earning.id.to_string(),
            "system",
            "register",
            Some(referred_name),
        );
        Ok(earning)
    }

    /// Called for every transaction reaching `completed`. No-op for users
    /// who were not referred; idempotently no-op for already-qualified
    /// records (count and volume still accumulate for reporting).
    pub fn on_completed_transaction(
        &self,
        referred_user: UserId,
        fiat_kobo: u64,
    ) -> Result<Option<ReferralEarning>, ReferralError> {
        let Some(earning_id) = self.by_referred.get(&referred_user).map(|e| *e) else {
            return Ok(None);
        };

        let (updated, newly_qualified) = {
            let mut rec = self
                .earnings
                .get_mut(&earning_id)
                .ok_or(ReferralError::NotFound(earning_id))?;

            rec.transaction_count = rec.transaction_count.saturating_add(1);
            rec.total_volume_kobo = rec.total_volume_kobo.saturating_add(fiat_kobo);

            let crossed = rec.status == QualificationStatus::Pending
                && rec.transaction_count >= self.qualification_threshold;
            if crossed {
                let bonus = self.policy.qualification_bonus(&rec);
                // Credit first, still under the entry lock: a failed credit
                // leaves the record pending so the next completion retries,
                // and a concurrent completion cannot qualify it twice.
                self.ledger.credit_earned(
                    rec.referrer,
                    bonus,
                    &format!("referral qualified: {}", rec.id),
                )?;
                rec.status = QualificationStatus::Qualified;
                rec.qualified_at = Some(chrono::Utc::now().timestamp_millis());
                rec.bonus_kobo = bonus;
            }
            (rec.clone(), crossed)
        };

        if newly_qualified {
            info!(
                earning_id = %updated.id,
                referrer = updated.referrer,
                bonus = %format_kobo(updated.bonus_kobo),
                policy = self.policy.name(),
                "referral qualified"
            );
            self.audit.record(
                EntityKind::Earning,
                &updated.id.to_string(),
                "system",
                "qualify",
                Some(&format!(
                    "{} bonus {}",
                    self.policy.name(),
                    format_kobo(updated.bonus_kobo)
                )),
            );
        }

        Ok(Some(updated))
    }

    /// A referrer's earning records, newest first.
    pub fn list_for(&self, referrer: UserId) -> Vec<ReferralEarning> {
        let ids = self
            .by_referrer
            .get(&referrer)
            .map(|v| v.clone())
            .unwrap_or_default();
        ids.iter()
            .rev()
            .filter_map(|id| self.earnings.get(id).map(|r| r.clone()))
            .collect()
    }

    /// Derived tier from the current qualified count. Read-only.
    pub fn tier_for(&self, referrer: UserId) -> ReferralTier {
        let qualified = self
            .list_for(referrer)
            .iter()
            .filter(|e| e.status == QualificationStatus::Qualified)
            .count() as u32;
        ReferralTier::for_qualified_count(qualified)
    }
}
