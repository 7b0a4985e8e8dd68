//! Transaction status FSM
//!
//! The transition graph is the single source of legality: any transition
//! not listed here is rejected without mutating the record.
//!
//! ```text
//! awaiting_payment ─┐
//!                   ├─(proof)→ under_review ─┬─(approve)→ completed
//! awaiting_crypto ──┘              ↑ ↓       ├─(reject)─→ failed
//!                                pending     │
//!                                            └─(cancel, from any
//!                                               non-terminal)→ cancelled
//! ```

use serde::{Deserialize, Serialize};

/// Transaction lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Buy order waiting for the user's fiat payment proof.
    AwaitingPayment,
    /// Sell order waiting for the user's crypto transfer proof.
    AwaitingCrypto,
    /// Proof attached; queued for admin disposition.
    UnderReview,
    /// Manual holding state for multi-step review.
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::AwaitingPayment => "awaiting_payment",
            TransactionStatus::AwaitingCrypto => "awaiting_crypto",
            TransactionStatus::UnderReview => "under_review",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further status transitions, only
    /// admin-note annotation.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Failed | TransactionStatus::Cancelled
        )
    }

    /// Whether `self -> to` is in the transition graph.
    pub fn can_transition(&self, to: TransactionStatus) -> bool {
        use TransactionStatus::*;
        match (self, to) {
            (AwaitingPayment | AwaitingCrypto, UnderReview) => true,
            (UnderReview, Completed | Failed | Pending) => true,
            (Pending, UnderReview) => true,
            // Explicit cancellation from any non-terminal state
            (from, Cancelled) if !from.is_terminal() => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
