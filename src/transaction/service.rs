//! TransactionService - drives the transaction FSM.
//!
//! Holds the authoritative per-id records; the map entry guard serializes
//! transitions per transaction so simultaneous admin actions cannot lose
//! updates. Completions are fed to the referral qualification engine after
//! the record lock is dropped.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::{info, warn};

use super::state::TransactionStatus;
use super::types::{AdminAction, AdminCommand, NewTransaction, Transaction, TransactionProof};
use crate::audit::{AuditTrail, EntityKind};
use crate::core_types::{TransactionId, UserId};
use crate::referral::ReferralEngine;

/// Transaction operation errors
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("Rejection requires a non-empty failure reason")]
    MissingFailureReason,

    #[error("Attached proof does not satisfy the awaiting state")]
    ProofIncomplete,
}

impl TransactionError {
    /// Stable string code for the gateway layer.
    pub fn code(&self) -> &'static str {
        match self {
            TransactionError::NotFound(_) => "TRANSACTION_NOT_FOUND",
            TransactionError::InvalidTransition { .. } => "INVALID_STATUS_TRANSITION",
            TransactionError::MissingFailureReason => "MISSING_REJECTION_REASON",
            TransactionError::ProofIncomplete => "PROOF_INCOMPLETE",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            TransactionError::NotFound(_) => 404,
            TransactionError::InvalidTransition { .. } => 409,
            TransactionError::MissingFailureReason | TransactionError::ProofIncomplete => 422,
        }
    }
}

/// Authoritative transaction store + state machine.
pub struct TransactionService {
    records: DashMap<TransactionId, Transaction>,
    by_user: DashMap<UserId, Vec<TransactionId>>,
    audit: Arc<AuditTrail>,
    referrals: Arc<ReferralEngine>,
}

impl TransactionService {
    pub fn new(audit: Arc<AuditTrail>, referrals: Arc<ReferralEngine>) -> Self {
        Self {
            records: DashMap::new(),
            by_user: DashMap::new(),
            audit,
            referrals,
        }
    }

    /// Create a transaction in its direction-specific awaiting state.
    pub fn create(&self, req: NewTransaction) -> Transaction {
        let tx = Transaction::new(req);
        self.by_user.entry(tx.user_id).or_default().push(tx.id);
        self.records.insert(tx.id, tx.clone());

        info!(
            id = %tx.id,
            reference = %tx.reference,
            user_id = tx.user_id,
            direction = tx.direction.as_str(),
            status = %tx.status,
            "transaction created"
        );
        self.audit.record(
            EntityKind::Transaction,
            &tx.id.to_string(),
            &format!("user:{}", tx.user_id),
            "create",
            Some(&tx.reference),
        );
        tx
    }

    /// Attach proof and move the transaction out of its awaiting state.
    pub fn attach_proof(
        &self,
        id: TransactionId,
        proof: TransactionProof,
    ) -> Result<Transaction, TransactionError> {
        let updated = {
            let mut rec = self
                .records
                .get_mut(&id)
                .ok_or(TransactionError::NotFound(id))?;

            if !rec.status.can_transition(TransactionStatus::UnderReview) {
                return Err(TransactionError::InvalidTransition {
                    from: rec.status,
                    to: TransactionStatus::UnderReview,
                });
            }
            if !proof.suffices_for(rec.direction) {
                return Err(TransactionError::ProofIncomplete);
            }

            rec.proof = Some(proof);
            rec.status = TransactionStatus::UnderReview;
            rec.clone()
        };

        self.audit.record(
            EntityKind::Transaction,
            &id.to_string(),
            &format!("user:{}", updated.user_id),
            "attach_proof",
            None,
        );
        Ok(updated)
    }

    /// Apply an admin command. Commands are validated in full before any
    /// mutation; an illegal transition leaves the record untouched.
    pub fn dispose(
        &self,
        id: TransactionId,
        cmd: AdminCommand,
    ) -> Result<Transaction, TransactionError> {
        if cmd.action == AdminAction::Reject && !cmd.has_usable_reason() {
            return Err(TransactionError::MissingFailureReason);
        }
        let target = cmd.action.target_status();

        let updated = {
            let mut rec = self
                .records
                .get_mut(&id)
                .ok_or(TransactionError::NotFound(id))?;

            if !rec.status.can_transition(target) {
                return Err(TransactionError::InvalidTransition {
                    from: rec.status,
                    to: target,
                });
            }

            rec.status = target;
            if let Some(notes) = &cmd.notes {
                rec.admin_notes.push(notes.clone());
            }
            if cmd.action == AdminAction::Reject {
                rec.failure_reason = cmd.reason.clone();
            }
            if target.is_terminal() {
                rec.completed_at = Some(chrono::Utc::now().timestamp_millis());
            }
            rec.clone()
        };

        info!(
            id = %id,
            actor = %cmd.actor,
            status = %updated.status,
            "transaction disposed"
        );
        self.audit.record(
            EntityKind::Transaction,
            &id.to_string(),
            &cmd.actor,
            updated.status.as_str(),
            cmd.reason.as_deref().or(cmd.notes.as_deref()),
        );

        // Completed transactions count toward the owner's referral
        // qualification. Record lock is already dropped here.
        if updated.status == TransactionStatus::Completed {
            if let Err(e) = self
                .referrals
                .on_completed_transaction(updated.user_id, updated.fiat_kobo)
            {
                warn!(user_id = updated.user_id, error = %e, "referral re-evaluation failed");
            }
        }

        Ok(updated)
    }

    /// Append an admin note without changing status. Permitted in any state,
    /// including terminal ones.
    pub fn annotate(
        &self,
        id: TransactionId,
        actor: &str,
        note: &str,
    ) -> Result<Transaction, TransactionError> {
        let updated = {
            let mut rec = self
                .records
                .get_mut(&id)
                .ok_or(TransactionError::NotFound(id))?;
            rec.admin_notes.push(note.to_string());
            rec.clone()
        };
        self.audit.record(
            EntityKind::Transaction,
            &id.to_string(),
            actor,
            "annotate",
            Some(note),
        );
        Ok(updated)
    }

    pub fn get(&self, id: TransactionId) -> Result<Transaction, TransactionError> {
        self.records
            .get(&id)
            .map(|r| r.clone())
            .ok_or(TransactionError::NotFound(id))
    }

    /// A user's transactions, newest first.
    pub fn list_for(&self, user_id: UserId) -> Vec<Transaction> {
        let ids = self
            .by_user
            .get(&user_id)
            .map(|v| v.clone())
            .unwrap_or_default();
        ids.iter()
            .rev()
            .filter_map(|id| self.records.get(id).map(|r| r.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::ledger::LedgerStore;
    use crate::transaction::types::{Direction, PaymentMethod};
    use rust_decimal::Decimal;

    fn harness() -> (TransactionService, Arc<ReferralEngine>, Arc<LedgerStore>) {
        let audit = Arc::new(AuditTrail::new());
        let ledger = Arc::new(LedgerStore::new(audit.clone()));
        let referrals = Arc::new(ReferralEngine::new(
            ledger.clone(),
            audit.clone(),
            &EngineConfig::default(),
        ));
        let service = TransactionService::new(audit, referrals.clone());
        (service, referrals, ledger)
    }

    fn buy_order(user_id: UserId) -> NewTransaction {
        NewTransaction {
            user_id,
            direction: Direction::Buy,
            asset: "BTC".into(),
            asset_amount: Decimal::new(5, 3), // 0.005 BTC
            rate: Decimal::new(17_000_000, 0),
            fiat_kobo: 8_500_000,
            fee_kobo: 50_000,
            payment_method: PaymentMethod::BankTransfer,
            bank_details: None,
        }
    }

    fn fiat_proof() -> TransactionProof {
        TransactionProof {
            payment_proof: Some("receipt.png".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_starts_in_awaiting() {
        let (service, _, _) = harness();
        let buy = service.create(buy_order(1));
        assert_eq!(buy.status, TransactionStatus::AwaitingPayment);
        assert!(buy.reference.starts_with("TXN-"));
        assert!(buy.completed_at.is_none());

        let sell = service.create(NewTransaction {
            direction: Direction::Sell,
            ..buy_order(1)
        });
        assert_eq!(sell.status, TransactionStatus::AwaitingCrypto);
    }

    #[test]
    fn test_proof_moves_to_review() {
        let (service, _, _) = harness();
        let tx = service.create(buy_order(1));

        let updated = service.attach_proof(tx.id, fiat_proof()).unwrap();
        assert_eq!(updated.status, TransactionStatus::UnderReview);

        // Second attachment is no longer a legal transition
        assert!(matches!(
            service.attach_proof(tx.id, fiat_proof()),
            Err(TransactionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_wrong_proof_kind_rejected() {
        let (service, _, _) = harness();
        let tx = service.create(buy_order(1));
        let chain_proof = TransactionProof {
            crypto_tx_hash: Some("0xabc".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.attach_proof(tx.id, chain_proof),
            Err(TransactionError::ProofIncomplete)
        ));
        assert_eq!(
            service.get(tx.id).unwrap().status,
            TransactionStatus::AwaitingPayment
        );
    }

    #[test]
    fn test_approve_sets_completed_at() {
        let (service, _, _) = harness();
        let tx = service.create(buy_order(1));
        service.attach_proof(tx.id, fiat_proof()).unwrap();

        let done = service
            .dispose(tx.id, AdminCommand::new(AdminAction::Approve, "admin@desk"))
            .unwrap();
        assert_eq!(done.status, TransactionStatus::Completed);
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn test_reject_requires_reason() {
        let (service, _, _) = harness();
        let tx = service.create(buy_order(1));
        service.attach_proof(tx.id, fiat_proof()).unwrap();

        assert!(matches!(
            service.dispose(tx.id, AdminCommand::new(AdminAction::Reject, "admin@desk")),
            Err(TransactionError::MissingFailureReason)
        ));
        // Still under review, nothing mutated
        assert_eq!(
            service.get(tx.id).unwrap().status,
            TransactionStatus::UnderReview
        );

        let failed = service
            .dispose(
                tx.id,
                AdminCommand::new(AdminAction::Reject, "admin@desk")
                    .with_reason("amount mismatch"),
            )
            .unwrap();
        assert_eq!(failed.status, TransactionStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some("amount mismatch"));
        assert!(failed.completed_at.is_some());
    }

    #[test]
    fn test_hold_and_resume() {
        let (service, _, _) = harness();
        let tx = service.create(buy_order(1));
        service.attach_proof(tx.id, fiat_proof()).unwrap();

        let held = service
            .dispose(tx.id, AdminCommand::new(AdminAction::Hold, "admin@desk"))
            .unwrap();
        assert_eq!(held.status, TransactionStatus::Pending);

        // Approve is not legal from the holding state
        assert!(matches!(
            service.dispose(tx.id, AdminCommand::new(AdminAction::Approve, "admin@desk")),
            Err(TransactionError::InvalidTransition { .. })
        ));

        let resumed = service
            .dispose(tx.id, AdminCommand::new(AdminAction::Resume, "admin@desk"))
            .unwrap();
        assert_eq!(resumed.status, TransactionStatus::UnderReview);
    }

    #[test]
    fn test_terminal_rejects_transitions_but_accepts_notes() {
        let (service, _, _) = harness();
        let tx = service.create(buy_order(1));
        service.attach_proof(tx.id, fiat_proof()).unwrap();
        service
            .dispose(tx.id, AdminCommand::new(AdminAction::Approve, "admin@desk"))
            .unwrap();

        for action in [AdminAction::Approve, AdminAction::Cancel, AdminAction::Hold] {
            assert!(matches!(
                service.dispose(tx.id, AdminCommand::new(action, "admin@desk")),
                Err(TransactionError::InvalidTransition { .. })
            ));
        }

        let noted = service
            .annotate(tx.id, "admin@desk", "settled late")
            .unwrap();
        assert_eq!(noted.admin_notes, vec!["settled late".to_string()]);
    }

    #[test]
    fn test_cancel_from_awaiting() {
        let (service, _, _) = harness();
        let tx = service.create(buy_order(1));
        let cancelled = service
            .dispose(
                tx.id,
                AdminCommand::new(AdminAction::Cancel, "user:1").with_notes("changed my mind"),
            )
            .unwrap();
        assert_eq!(cancelled.status, TransactionStatus::Cancelled);
        assert!(cancelled.completed_at.is_some());
    }

    #[test]
    fn test_completion_feeds_referral_engine() {
        let (service, referrals, ledger) = harness();
        referrals.register_referral(100, 1, "Ada Obi").unwrap();

        for _ in 0..3 {
            let tx = service.create(buy_order(1));
            service.attach_proof(tx.id, fiat_proof()).unwrap();
            service
                .dispose(tx.id, AdminCommand::new(AdminAction::Approve, "admin@desk"))
                .unwrap();
        }

        let earnings = referrals.list_for(100);
        assert_eq!(earnings.len(), 1);
        assert_eq!(earnings[0].transaction_count, 3);
        assert!(ledger.get_balance(100).available > 0);
    }

    #[test]
    fn test_list_for_newest_first() {
        let (service, _, _) = harness();
        let first = service.create(buy_order(1));
        let second = service.create(buy_order(1));
        service.create(buy_order(2));

        let list = service.list_for(1);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, second.id);
        assert_eq!(list[1].id, first.id);
    }
}
