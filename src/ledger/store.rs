//! Keyed balance store.
//!
//! One [`AccountBalance`] per user behind a concurrent map. The map entry
//! guard serializes mutations per user, which makes `reserve` a single
//! locked check-and-debit: two racing withdrawal requests can never both
//! observe sufficient balance.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::audit::{AuditTrail, EntityKind};
use crate::balance::{AccountBalance, BalanceError, BalanceField, BalanceSnapshot};
use crate::core_types::UserId;
use crate::money::format_kobo;

/// Ledger operation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient available balance")]
    InsufficientBalance,

    #[error("No balance record for user {0}")]
    UnknownUser(UserId),

    #[error("Balance arithmetic failed: {0}")]
    Arithmetic(BalanceError),
}

impl From<BalanceError> for LedgerError {
    fn from(e: BalanceError) -> Self {
        match e {
            BalanceError::InsufficientAvailable => LedgerError::InsufficientBalance,
            other => LedgerError::Arithmetic(other),
        }
    }
}

/// A held withdrawal amount, debited from available balance at acceptance.
///
/// Deliberately neither `Clone` nor `Copy`: `release` and `settle` consume
/// the value, so a reservation can be applied exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct Reservation {
    user_id: UserId,
    amount_kobo: u64,
}

impl Reservation {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn amount_kobo(&self) -> u64 {
        self.amount_kobo
    }
}

/// Per-user balance store. All mutations are audited.
pub struct LedgerStore {
    accounts: DashMap<UserId, AccountBalance>,
    audit: Arc<AuditTrail>,
}

impl LedgerStore {
    pub fn new(audit: Arc<AuditTrail>) -> Self {
        Self {
            accounts: DashMap::new(),
            audit,
        }
    }

    /// Balance snapshot. Users with no history read as all-zero without
    /// creating a record.
    pub fn get_balance(&self, user_id: UserId) -> BalanceSnapshot {
        self.accounts
            .get(&user_id)
            .map(|b| b.snapshot())
            .unwrap_or_default()
    }

    /// Credit earned funds: available and lifetime earnings move together
    /// under one entry lock, keeping the earnings identity intact.
    pub fn credit_earned(
        &self,
        user_id: UserId,
        amount_kobo: u64,
        cause: &str,
    ) -> Result<BalanceSnapshot, LedgerError> {
        let mut entry = self.accounts.entry(user_id).or_default();
        entry.credit_earned(amount_kobo)?;
        let snap = entry.snapshot();
        drop(entry);

        debug!(user_id, amount = %format_kobo(amount_kobo), cause, "ledger credit");
        self.audit.record(
            EntityKind::Ledger,
            &user_id.to_string(),
            "system",
            "credit_earned",
            Some(cause),
        );
        Ok(snap)
    }

    /// Raw signed delta to one balance field, for admin corrections.
    pub fn apply_delta(
        &self,
        user_id: UserId,
        field: BalanceField,
        delta_kobo: i64,
        actor: &str,
        cause: &str,
    ) -> Result<BalanceSnapshot, LedgerError> {
        let mut entry = self.accounts.entry(user_id).or_default();
        entry.adjust(field, delta_kobo)?;
        let snap = entry.snapshot();
        drop(entry);

        self.audit.record(
            EntityKind::Ledger,
            &user_id.to_string(),
            actor,
            &format!("delta:{}:{}", field.as_str(), delta_kobo),
            Some(cause),
        );
        Ok(snap)
    }

    /// Atomically check `available >= amount` and debit it into pending.
    ///
    /// This is the only suspend point that must be atomic (two concurrent
    /// requests must not both pass a stale check); the entry guard is held
    /// across check and debit.
    pub fn reserve(
        &self,
        user_id: UserId,
        amount_kobo: u64,
        cause: &str,
    ) -> Result<Reservation, LedgerError> {
        let mut entry = self.accounts.entry(user_id).or_default();
        entry.reserve(amount_kobo)?;
        drop(entry);

        debug!(user_id, amount = %format_kobo(amount_kobo), cause, "ledger reserve");
        self.audit.record(
            EntityKind::Ledger,
            &user_id.to_string(),
            "system",
            "reserve",
            Some(cause),
        );
        Ok(Reservation {
            user_id,
            amount_kobo,
        })
    }

    /// Return a reserved amount to available balance (rejection path).
    pub fn release(&self, reservation: Reservation, cause: &str) -> Result<(), LedgerError> {
        let Reservation {
            user_id,
            amount_kobo,
        } = reservation;
        let mut entry = self
            .accounts
            .get_mut(&user_id)
            .ok_or(LedgerError::UnknownUser(user_id))?;
        entry.release(amount_kobo)?;
        drop(entry);

        self.audit.record(
            EntityKind::Ledger,
            &user_id.to_string(),
            "system",
            "release",
            Some(cause),
        );
        Ok(())
    }

    /// Move a reserved amount into total withdrawn (payment-completion path).
    pub fn settle(&self, reservation: Reservation, cause: &str) -> Result<(), LedgerError> {
        let Reservation {
            user_id,
            amount_kobo,
        } = reservation;
        let mut entry = self
            .accounts
            .get_mut(&user_id)
            .ok_or_else(|| {
                warn!(user_id, "settle against missing balance record");
                LedgerError::UnknownUser(user_id)
            })?;
        entry.settle(amount_kobo)?;
        drop(entry);

        self.audit.record(
            EntityKind::Ledger,
            &user_id.to_string(),
            "system",
            "settle",
            Some(cause),
        );
        Ok(())
    }
}
