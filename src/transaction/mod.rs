//! Transaction state machine
//!
//! Lifecycle of a single buy/sell crypto transaction: creation in a
//! direction-specific awaiting state, proof attachment, admin disposition,
//! terminal retention for audit. Completions feed the referral
//! qualification engine.

mod service;
mod state;
mod types;

pub use service::{TransactionError, TransactionService};
pub use state::TransactionStatus;
pub use types::{
    AdminAction, AdminCommand, Direction, NewTransaction, PaymentMethod, Transaction,
    TransactionProof,
};
