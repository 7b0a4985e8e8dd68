//! ENFORCED BALANCE TYPE - Used by LedgerStore
//!
//! This is the SINGLE source of truth for per-user balance arithmetic.
//! ALL balance mutations MUST go through these methods.
//!
//! # Enforcement Strategy:
//! 1. Fields are PRIVATE - no direct access
//! 2. All mutations return Result - errors are explicit
//! 3. Version auto-increments - audit trail
//! 4. checked_add/sub - overflow protection
//! 5. Type system prevents bypassing validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Balance arithmetic errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BalanceError {
    #[error("Insufficient available balance")]
    InsufficientAvailable,

    #[error("Insufficient pending balance")]
    InsufficientPending,

    #[error("Balance overflow")]
    Overflow,

    #[error("Balance underflow")]
    Underflow,
}

/// Which field of the balance a raw delta targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceField {
    Available,
    Pending,
    Withdrawn,
    TotalEarned,
}

impl BalanceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceField::Available => "available",
            BalanceField::Pending => "pending",
            BalanceField::Withdrawn => "withdrawn",
            BalanceField::TotalEarned => "total_earned",
        }
    }
}

/// Per-user ledger balance, all amounts in kobo.
///
/// # Invariants (ENFORCED by private fields):
/// - `available` never goes negative (checked before every debit)
/// - `total_earned == available + pending + withdrawn` after every balanced
///   operation (`credit_earned`, `reserve`, `release`, `settle`)
/// - No overflow/underflow (checked arithmetic)
/// - `version` increments on every mutation
///
/// `pending` holds amounts that belong to the user but cannot be withdrawn:
/// reservations held by non-terminal withdrawal requests.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountBalance {
    available: u64,
    pending: u64,
    withdrawn: u64,
    total_earned: u64,
    version: u64,
}

/// Read-only snapshot handed to calling layers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub available: u64,
    pub pending: u64,
    pub withdrawn: u64,
    pub total_earned: u64,
    pub version: u64,
}

impl AccountBalance {
    // ============================================================
    // READ-ONLY GETTERS (safe to expose)
    // ============================================================

    #[inline(always)]
    pub const fn available(&self) -> u64 {
        self.available
    }

    #[inline(always)]
    pub const fn pending(&self) -> u64 {
        self.pending
    }

    #[inline(always)]
    pub const fn withdrawn(&self) -> u64 {
        self.withdrawn
    }

    #[inline(always)]
    pub const fn total_earned(&self) -> u64 {
        self.total_earned
    }

    #[inline(always)]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Snapshot for callers outside the store lock.
    pub const fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            available: self.available,
            pending: self.pending,
            withdrawn: self.withdrawn,
            total_earned: self.total_earned,
            version: self.version,
        }
    }

    /// Check the earnings identity. Raw `adjust` deltas may break it until
    /// the balancing delta lands; balanced operations never do.
    pub const fn is_consistent(&self) -> bool {
        match self.available.checked_add(self.pending) {
            Some(sum) => match sum.checked_add(self.withdrawn) {
                Some(total) => total == self.total_earned,
                None => false,
            },
            None => false,
        }
    }

    // ============================================================
    // VALIDATED MUTATIONS (ENFORCED operations)
    // ============================================================

    /// Credit newly earned funds: increases both `available` and
    /// `total_earned` in one operation so the identity holds.
    pub fn credit_earned(&mut self, amount: u64) -> Result<(), BalanceError> {
        let available = self
            .available
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        let total_earned = self
            .total_earned
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        self.available = available;
        self.total_earned = total_earned;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Reserve funds for a withdrawal request: available -> pending.
    ///
    /// The check and the debit happen in one call; the store holds the user
    /// entry lock around it, so two racing requests cannot both pass.
    pub fn reserve(&mut self, amount: u64) -> Result<(), BalanceError> {
        if self.available < amount {
            return Err(BalanceError::InsufficientAvailable);
        }
        self.available = self
            .available
            .checked_sub(amount)
            .ok_or(BalanceError::Underflow)?;
        self.pending = self
            .pending
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Return a reserved amount: pending -> available (rejection path).
    pub fn release(&mut self, amount: u64) -> Result<(), BalanceError> {
        if self.pending < amount {
            return Err(BalanceError::InsufficientPending);
        }
        self.pending = self
            .pending
            .checked_sub(amount)
            .ok_or(BalanceError::Underflow)?;
        self.available = self
            .available
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Settle a reserved amount: pending -> withdrawn (payment completed).
    pub fn settle(&mut self, amount: u64) -> Result<(), BalanceError> {
        if self.pending < amount {
            return Err(BalanceError::InsufficientPending);
        }
        self.pending = self
            .pending
            .checked_sub(amount)
            .ok_or(BalanceError::Underflow)?;
        self.withdrawn = self
            .withdrawn
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Raw signed delta against a single field, for admin corrections.
    ///
    /// No field ever goes negative. The caller owns restoring the earnings
    /// identity with a balancing delta.
    pub fn adjust(&mut self, field: BalanceField, delta: i64) -> Result<(), BalanceError> {
        let target = match field {
            BalanceField::Available => &mut self.available,
            BalanceField::Pending => &mut self.pending,
            BalanceField::Withdrawn => &mut self.withdrawn,
            BalanceField::TotalEarned => &mut self.total_earned,
        };
        let next = if delta >= 0 {
            target
                .checked_add(delta as u64)
                .ok_or(BalanceError::Overflow)?
        } else {
            target
                .checked_sub(delta.unsigned_abs())
                .ok_or(BalanceError::Underflow)?
        };
        *target = next;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }
}

// ============================================================
// TESTS - Prove enforcement works
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_earned() {
        let mut bal = AccountBalance::default();
        bal.credit_earned(100_000).unwrap();
        assert_eq!(bal.available(), 100_000);
        assert_eq!(bal.total_earned(), 100_000);
        assert_eq!(bal.version(), 1);
        assert!(bal.is_consistent());
    }

    #[test]
    fn test_credit_overflow() {
        let mut bal = AccountBalance::default();
        bal.credit_earned(u64::MAX).unwrap();
        assert!(bal.credit_earned(1).is_err());
    }

    #[test]
    fn test_reserve_insufficient() {
        let mut bal = AccountBalance::default();
        bal.credit_earned(50_000).unwrap();

        assert_eq!(
            bal.reserve(100_000),
            Err(BalanceError::InsufficientAvailable)
        );
        assert_eq!(bal.available(), 50_000); // Unchanged
        assert_eq!(bal.version(), 1); // No mutation recorded
    }

    #[test]
    fn test_reserve_release() {
        let mut bal = AccountBalance::default();
        bal.credit_earned(8_500_000).unwrap();

        bal.reserve(8_500_000).unwrap();
        assert_eq!(bal.available(), 0);
        assert_eq!(bal.pending(), 8_500_000);
        assert!(bal.is_consistent());

        bal.release(8_500_000).unwrap();
        assert_eq!(bal.available(), 8_500_000);
        assert_eq!(bal.pending(), 0);
        assert!(bal.is_consistent());
    }

    #[test]
    fn test_settle_moves_to_withdrawn() {
        let mut bal = AccountBalance::default();
        bal.credit_earned(300_000).unwrap();
        bal.reserve(200_000).unwrap();

        bal.settle(200_000).unwrap();
        assert_eq!(bal.available(), 100_000);
        assert_eq!(bal.pending(), 0);
        assert_eq!(bal.withdrawn(), 200_000);
        assert_eq!(bal.total_earned(), 300_000);
        assert!(bal.is_consistent());
    }

    #[test]
    fn test_release_more_than_pending() {
        let mut bal = AccountBalance::default();
        bal.credit_earned(100).unwrap();
        bal.reserve(50).unwrap();
        assert_eq!(bal.release(60), Err(BalanceError::InsufficientPending));
    }

    #[test]
    fn test_adjust_rejects_negative_result() {
        let mut bal = AccountBalance::default();
        bal.credit_earned(100).unwrap();
        assert_eq!(
            bal.adjust(BalanceField::Available, -200),
            Err(BalanceError::Underflow)
        );
        assert_eq!(bal.available(), 100);
    }

    #[test]
    fn test_adjust_balanced_pair_keeps_identity() {
        let mut bal = AccountBalance::default();
        bal.adjust(BalanceField::Available, 500).unwrap();
        assert!(!bal.is_consistent()); // half-applied
        bal.adjust(BalanceField::TotalEarned, 500).unwrap();
        assert!(bal.is_consistent());
    }

    #[test]
    fn test_version_increments_per_mutation() {
        let mut bal = AccountBalance::default();
        bal.credit_earned(1_000).unwrap();
        bal.reserve(400).unwrap();
        bal.release(100).unwrap();
        bal.settle(300).unwrap();
        assert_eq!(bal.version(), 4);
    }
}
