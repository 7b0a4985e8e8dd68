//! WithdrawalWorkflow - request validation and approval lifecycle.
//!
//! Validation failures are reported synchronously and never partially
//! mutate state: every check runs before the first write, and ledger
//! reconciliation happens before the status flips on terminal transitions.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::info;

use super::types::{WithdrawalRequest, WithdrawalStatus};
use crate::audit::{AuditTrail, EntityKind};
use crate::core_types::{BankDetails, UserId, WithdrawalId};
use crate::ledger::{LedgerError, LedgerStore};
use crate::money::format_kobo;

/// Withdrawal operation errors
#[derive(Debug, Error)]
pub enum WithdrawalError {
    #[error("Withdrawal below minimum of ₦{}", format_kobo(*.min_kobo))]
    BelowMinimum { min_kobo: u64 },

    #[error("Bank details are incomplete")]
    InvalidBankDetails,

    #[error("Insufficient available balance")]
    InsufficientBalance,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    },

    #[error("Rejection requires a non-empty reason")]
    MissingRejectionReason,

    #[error("Withdrawal request not found: {0}")]
    NotFound(WithdrawalId),

    #[error(transparent)]
    Ledger(LedgerError),
}

impl WithdrawalError {
    pub fn code(&self) -> &'static str {
        match self {
            WithdrawalError::BelowMinimum { .. } => "BELOW_MINIMUM_WITHDRAWAL",
            WithdrawalError::InvalidBankDetails => "INVALID_BANK_DETAILS",
            WithdrawalError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            WithdrawalError::InvalidTransition { .. } => "INVALID_STATUS_TRANSITION",
            WithdrawalError::MissingRejectionReason => "MISSING_REJECTION_REASON",
            WithdrawalError::NotFound(_) => "WITHDRAWAL_NOT_FOUND",
            WithdrawalError::Ledger(_) => "LEDGER_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            WithdrawalError::BelowMinimum { .. }
            | WithdrawalError::InvalidBankDetails
            | WithdrawalError::MissingRejectionReason => 422,
            WithdrawalError::InsufficientBalance => 409,
            WithdrawalError::InvalidTransition { .. } => 409,
            WithdrawalError::NotFound(_) => 404,
            WithdrawalError::Ledger(_) => 500,
        }
    }
}

impl From<LedgerError> for WithdrawalError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance => WithdrawalError::InsufficientBalance,
            other => WithdrawalError::Ledger(other),
        }
    }
}

/// Withdrawal request store + approval workflow.
pub struct WithdrawalWorkflow {
    requests: DashMap<WithdrawalId, WithdrawalRequest>,
    by_user: DashMap<UserId, Vec<WithdrawalId>>,
    ledger: Arc<LedgerStore>,
    audit: Arc<AuditTrail>,
    min_kobo: u64,
}

impl WithdrawalWorkflow {
    pub fn new(ledger: Arc<LedgerStore>, audit: Arc<AuditTrail>, min_kobo: u64) -> Self {
        Self {
            requests: DashMap::new(),
            by_user: DashMap::new(),
            ledger,
            audit,
            min_kobo,
        }
    }

    /// Validate and accept a withdrawal request. The amount is reserved out
    /// of available balance in the same operation that checks it.
    pub fn request(
        &self,
        user_id: UserId,
        amount_kobo: u64,
        bank_details: BankDetails,
    ) -> Result<WithdrawalRequest, WithdrawalError> {
        if amount_kobo < self.min_kobo {
            return Err(WithdrawalError::BelowMinimum {
                min_kobo: self.min_kobo,
            });
        }
        if !bank_details.is_complete() {
            return Err(WithdrawalError::InvalidBankDetails);
        }

        let reservation = self
            .ledger
            .reserve(user_id, amount_kobo, "withdrawal request")?;

        let request = WithdrawalRequest::new(user_id, amount_kobo, bank_details, reservation);
        let view = request.to_view();
        self.by_user.entry(user_id).or_default().push(request.id);
        self.requests.insert(request.id, request);

        info!(
            id = %view.id,
            reference = %view.reference,
            user_id,
            amount = %format_kobo(amount_kobo),
            "withdrawal requested"
        );
        self.audit.record(
            EntityKind::Withdrawal,
            &view.id.to_string(),
            &format!("user:{user_id}"),
            "request",
            Some(&view.reference),
        );
        Ok(view)
    }

    /// `pending -> approved`. No balance effect; the amount is already
    /// reserved.
    pub fn approve(
        &self,
        id: WithdrawalId,
        actor: &str,
    ) -> Result<WithdrawalRequest, WithdrawalError> {
        let view = {
            let mut rec = self
                .requests
                .get_mut(&id)
                .ok_or(WithdrawalError::NotFound(id))?;
            Self::check_transition(&rec, WithdrawalStatus::Approved)?;

            rec.status = WithdrawalStatus::Approved;
            rec.processed_at = Some(chrono::Utc::now().timestamp_millis());
            rec.to_view()
        };

        self.audit
            .record(EntityKind::Withdrawal, &id.to_string(), actor, "approve", None);
        Ok(view)
    }

    /// `approved -> paid`. Settles the reservation into total withdrawn.
    pub fn mark_paid(
        &self,
        id: WithdrawalId,
        actor: &str,
    ) -> Result<WithdrawalRequest, WithdrawalError> {
        let view = {
            let mut rec = self
                .requests
                .get_mut(&id)
                .ok_or(WithdrawalError::NotFound(id))?;
            Self::check_transition(&rec, WithdrawalStatus::Paid)?;

            let reservation = rec
                .reservation
                .take()
                .expect("non-terminal request always holds its reservation");
            // Cannot fail: the reservation guarantees pending covers it
            self.ledger
                .settle(reservation, &rec.reference)
                .expect("ledger rejected settle of a held reservation");

            rec.status = WithdrawalStatus::Paid;
            rec.processed_at = Some(chrono::Utc::now().timestamp_millis());
            rec.to_view()
        };

        info!(id = %id, actor, "withdrawal paid");
        self.audit
            .record(EntityKind::Withdrawal, &id.to_string(), actor, "pay", None);
        Ok(view)
    }

    /// `pending -> rejected`. Requires a non-empty reason and restores the
    /// reserved amount to available balance.
    pub fn reject(
        &self,
        id: WithdrawalId,
        actor: &str,
        reason: &str,
    ) -> Result<WithdrawalRequest, WithdrawalError> {
        if reason.trim().is_empty() {
            return Err(WithdrawalError::MissingRejectionReason);
        }

        let view = {
            let mut rec = self
                .requests
                .get_mut(&id)
                .ok_or(WithdrawalError::NotFound(id))?;
            Self::check_transition(&rec, WithdrawalStatus::Rejected)?;

            let reservation = rec
                .reservation
                .take()
                .expect("non-terminal request always holds its reservation");
            // Cannot fail: the reservation guarantees pending covers it
            self.ledger
                .release(reservation, &rec.reference)
                .expect("ledger rejected release of a held reservation");

            rec.status = WithdrawalStatus::Rejected;
            rec.processed_at = Some(chrono::Utc::now().timestamp_millis());
            rec.rejection_reason = Some(reason.trim().to_string());
            rec.to_view()
        };

        info!(id = %id, actor, reason, "withdrawal rejected");
        self.audit.record(
            EntityKind::Withdrawal,
            &id.to_string(),
            actor,
            "reject",
            Some(reason),
        );
        Ok(view)
    }

    /// Append an audit note without changing status. Permitted in any state.
    pub fn annotate(
        &self,
        id: WithdrawalId,
        actor: &str,
        note: &str,
    ) -> Result<WithdrawalRequest, WithdrawalError> {
        let view = {
            let mut rec = self
                .requests
                .get_mut(&id)
                .ok_or(WithdrawalError::NotFound(id))?;
            rec.admin_notes.push(note.to_string());
            rec.to_view()
        };
        self.audit.record(
            EntityKind::Withdrawal,
            &id.to_string(),
            actor,
            "annotate",
            Some(note),
        );
        Ok(view)
    }

    pub fn get(&self, id: WithdrawalId) -> Result<WithdrawalRequest, WithdrawalError> {
        self.requests
            .get(&id)
            .map(|r| r.to_view())
            .ok_or(WithdrawalError::NotFound(id))
    }

    /// A user's withdrawal requests, newest first.
    pub fn list_for(&self, user_id: UserId) -> Vec<WithdrawalRequest> {
        let ids = self
            .by_user
            .get(&user_id)
            .map(|v| v.clone())
            .unwrap_or_default();
        ids.iter()
            .rev()
            .filter_map(|id| self.requests.get(id).map(|r| r.to_view()))
            .collect()
    }

    fn check_transition(
        rec: &WithdrawalRequest,
        to: WithdrawalStatus,
    ) -> Result<(), WithdrawalError> {
        if !rec.status.can_transition(to) {
            return Err(WithdrawalError::InvalidTransition {
                from: rec.status,
                to,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: u64 = 200_000; // ₦2,000

    fn harness() -> (WithdrawalWorkflow, Arc<LedgerStore>) {
        let audit = Arc::new(AuditTrail::new());
        let ledger = Arc::new(LedgerStore::new(audit.clone()));
        (
            WithdrawalWorkflow::new(ledger.clone(), audit, MIN),
            ledger,
        )
    }

    fn bank() -> BankDetails {
        BankDetails::new("Ada Obi", "0123456789", "GTBank")
    }

    #[test]
    fn test_below_minimum_rejected_regardless_of_balance() {
        let (wf, ledger) = harness();
        ledger.credit_earned(1, 10_000_000, "bonus").unwrap();

        let err = wf.request(1, 199_999, bank()).unwrap_err();
        assert!(matches!(err, WithdrawalError::BelowMinimum { .. }));
        // Balance untouched
        assert_eq!(ledger.get_balance(1).available, 10_000_000);
    }

    #[test]
    fn test_incomplete_bank_details() {
        let (wf, ledger) = harness();
        ledger.credit_earned(1, 10_000_000, "bonus").unwrap();

        let incomplete = BankDetails::new("Ada Obi", "", "GTBank");
        assert!(matches!(
            wf.request(1, 500_000, incomplete),
            Err(WithdrawalError::InvalidBankDetails)
        ));
        assert_eq!(ledger.get_balance(1).available, 10_000_000);
    }

    #[test]
    fn test_exact_balance_succeeds_over_balance_fails() {
        let (wf, ledger) = harness();
        ledger.credit_earned(1, 8_500_000, "bonus").unwrap(); // ₦85,000

        assert!(matches!(
            wf.request(1, 9_000_000, bank()),
            Err(WithdrawalError::InsufficientBalance)
        ));

        let req = wf.request(1, 8_500_000, bank()).unwrap();
        assert_eq!(req.status, WithdrawalStatus::Pending);
        assert!(req.reference.starts_with("WDL-"));
        assert_eq!(ledger.get_balance(1).available, 0);
    }

    #[test]
    fn test_full_success_path() {
        let (wf, ledger) = harness();
        ledger.credit_earned(1, 1_000_000, "bonus").unwrap();
        let req = wf.request(1, 400_000, bank()).unwrap();

        let approved = wf.approve(req.id, "admin@desk").unwrap();
        assert_eq!(approved.status, WithdrawalStatus::Approved);
        assert!(approved.processed_at.is_some());
        // Approval has no balance effect
        assert_eq!(ledger.get_balance(1).pending, 400_000);

        let paid = wf.mark_paid(req.id, "admin@desk").unwrap();
        assert_eq!(paid.status, WithdrawalStatus::Paid);
        let snap = ledger.get_balance(1);
        assert_eq!(snap.pending, 0);
        assert_eq!(snap.withdrawn, 400_000);
        assert_eq!(snap.available, 600_000);
        assert_eq!(snap.total_earned, 1_000_000);
    }

    #[test]
    fn test_reject_without_reason_keeps_reservation() {
        let (wf, ledger) = harness();
        ledger.credit_earned(1, 1_000_000, "bonus").unwrap();
        let req = wf.request(1, 400_000, bank()).unwrap();

        assert!(matches!(
            wf.reject(req.id, "admin@desk", "   "),
            Err(WithdrawalError::MissingRejectionReason)
        ));
        let unchanged = wf.get(req.id).unwrap();
        assert_eq!(unchanged.status, WithdrawalStatus::Pending);
        assert_eq!(ledger.get_balance(1).pending, 400_000);
    }

    #[test]
    fn test_reject_with_reason_restores_balance() {
        let (wf, ledger) = harness();
        ledger.credit_earned(1, 1_000_000, "bonus").unwrap();
        let req = wf.request(1, 400_000, bank()).unwrap();

        let rejected = wf.reject(req.id, "admin@desk", "name mismatch").unwrap();
        assert_eq!(rejected.status, WithdrawalStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("name mismatch"));

        let snap = ledger.get_balance(1);
        assert_eq!(snap.available, 1_000_000);
        assert_eq!(snap.pending, 0);
    }

    #[test]
    fn test_approved_cannot_be_rejected() {
        let (wf, ledger) = harness();
        ledger.credit_earned(1, 1_000_000, "bonus").unwrap();
        let req = wf.request(1, 400_000, bank()).unwrap();
        wf.approve(req.id, "admin@desk").unwrap();

        assert!(matches!(
            wf.reject(req.id, "admin@desk", "too late"),
            Err(WithdrawalError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_pay_requires_approval() {
        let (wf, ledger) = harness();
        ledger.credit_earned(1, 1_000_000, "bonus").unwrap();
        let req = wf.request(1, 400_000, bank()).unwrap();

        assert!(matches!(
            wf.mark_paid(req.id, "admin@desk"),
            Err(WithdrawalError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_annotate_any_state() {
        let (wf, ledger) = harness();
        ledger.credit_earned(1, 1_000_000, "bonus").unwrap();
        let req = wf.request(1, 400_000, bank()).unwrap();
        wf.reject(req.id, "admin@desk", "bad account").unwrap();

        let noted = wf
            .annotate(req.id, "admin@desk", "user notified")
            .unwrap();
        assert_eq!(noted.status, WithdrawalStatus::Rejected);
        assert_eq!(noted.admin_notes, vec!["user notified".to_string()]);
    }

    #[test]
    fn test_unknown_id() {
        let (wf, _) = harness();
        assert!(matches!(
            wf.approve(WithdrawalId::new(), "admin@desk"),
            Err(WithdrawalError::NotFound(_))
        ));
    }
}
