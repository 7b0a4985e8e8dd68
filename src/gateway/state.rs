//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::audit::AuditTrail;
use crate::config::EngineConfig;
use crate::ledger::LedgerStore;
use crate::referral::ReferralEngine;
use crate::transaction::TransactionService;
use crate::withdrawal::WithdrawalWorkflow;

/// The wired engine stack. Cheap to clone; all services are shared.
#[derive(Clone)]
pub struct AppState {
    pub transactions: Arc<TransactionService>,
    pub withdrawals: Arc<WithdrawalWorkflow>,
    pub referrals: Arc<ReferralEngine>,
    pub ledger: Arc<LedgerStore>,
    pub audit: Arc<AuditTrail>,
}

impl AppState {
    /// Wire the full engine from config. Used by `main` and by integration
    /// tests.
    pub fn build(config: &EngineConfig) -> Self {
        let audit = Arc::new(AuditTrail::new());
        let ledger = Arc::new(LedgerStore::new(audit.clone()));
        let referrals = Arc::new(ReferralEngine::new(ledger.clone(), audit.clone(), config));
        let transactions = Arc::new(TransactionService::new(audit.clone(), referrals.clone()));
        let withdrawals = Arc::new(WithdrawalWorkflow::new(
            ledger.clone(),
            audit.clone(),
            config.min_withdrawal_kobo,
        ));

        Self {
            transactions,
            withdrawals,
            referrals,
            ledger,
            audit,
        }
    }
}
