//! Withdrawal request record and status FSM.
//!
//! ```text
//! pending ──(approve)→ approved ──(pay)→ paid
//!    └──────(reject)→ rejected
//! ```
//!
//! `approved` cannot become `rejected`: the money is already reserved and
//! the payout is in flight. Rejection happens before approval only.

use serde::{Deserialize, Serialize};

use crate::core_types::{BankDetails, UserId, WithdrawalId};
use crate::ledger::Reservation;

/// Withdrawal request lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
            WithdrawalStatus::Paid => "paid",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WithdrawalStatus::Rejected | WithdrawalStatus::Paid)
    }

    pub fn can_transition(&self, to: WithdrawalStatus) -> bool {
        use WithdrawalStatus::*;
        matches!(
            (self, to),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Paid)
        )
    }
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A withdrawal request. The reservation debited at acceptance rides on the
/// record until a terminal transition consumes it; it never serializes out.
#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    /// Externally quotable reference, distinct from `id`.
    pub reference: String,
    pub user_id: UserId,
    pub amount_kobo: u64,
    pub bank_details: BankDetails,
    pub status: WithdrawalStatus,
    /// Unix millis.
    pub requested_at: i64,
    /// Set when the request leaves `pending`.
    pub processed_at: Option<i64>,
    pub admin_notes: Vec<String>,
    pub rejection_reason: Option<String>,
    #[serde(skip)]
    pub(crate) reservation: Option<Reservation>,
}

impl WithdrawalRequest {
    pub(crate) fn new(
        user_id: UserId,
        amount_kobo: u64,
        bank_details: BankDetails,
        reservation: Reservation,
    ) -> Self {
        Self {
            id: WithdrawalId::new(),
            reference: crate::refnum::generate("WDL"),
            user_id,
            amount_kobo,
            bank_details,
            status: WithdrawalStatus::Pending,
            requested_at: chrono::Utc::now().timestamp_millis(),
            processed_at: None,
            admin_notes: Vec::new(),
            rejection_reason: None,
            reservation: Some(reservation),
        }
    }

    /// Copy without the reservation, safe to hand to callers.
    pub fn to_view(&self) -> WithdrawalRequest {
        WithdrawalRequest {
            id: self.id,
            reference: self.reference.clone(),
            user_id: self.user_id,
            amount_kobo: self.amount_kobo,
            bank_details: self.bank_details.clone(),
            status: self.status,
            requested_at: self.requested_at,
            processed_at: self.processed_at,
            admin_notes: self.admin_notes.clone(),
            rejection_reason: self.rejection_reason.clone(),
            reservation: None,
        }
    }
}
