//! Withdrawal workflow
//!
//! Accepts withdrawal requests against available balance, reserves the
//! amount at acceptance, and reconciles the ledger on terminal outcomes.

mod types;
mod workflow;

pub use types::{WithdrawalRequest, WithdrawalStatus};
pub use workflow::{WithdrawalError, WithdrawalWorkflow};
