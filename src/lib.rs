//! nairadesk - Transaction & Withdrawal Ledger Engine
//!
//! The financial core of an OTC crypto desk: state machines for buy/sell
//! transaction review, referral-earning qualification and withdrawal
//! approval, tied together by per-user balance bookkeeping with an
//! append-only audit trail.
//!
//! # Modules
//!
//! - [`core_types`] - Identifier types (UserId, ULID-backed entity ids)
//! - [`money`] - Kobo/naira conversion
//! - [`balance`] - Enforced per-user balance type
//! - [`audit`] - Append-only audit trail
//! - [`ledger`] - Keyed balance store with atomic reservations
//! - [`transaction`] - Buy/sell transaction state machine
//! - [`referral`] - Qualification engine + commission policies
//! - [`withdrawal`] - Withdrawal request workflow
//! - [`gateway`] - HTTP surface (axum)

// Core types - must be first!
pub mod core_types;

// Cross-cutting primitives
pub mod audit;
pub mod balance;
pub mod money;
pub mod refnum;

// Domain services
pub mod ledger;
pub mod referral;
pub mod transaction;
pub mod withdrawal;

// Operational surface
pub mod config;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use audit::{AuditEntry, AuditTrail, EntityKind};
pub use balance::{AccountBalance, BalanceField, BalanceSnapshot};
pub use config::{AppConfig, EngineConfig};
pub use core_types::{BankDetails, EarningId, TransactionId, UserId, WithdrawalId};
pub use gateway::AppState;
pub use ledger::{LedgerError, LedgerStore, Reservation};
pub use referral::{
    CommissionPolicy, FixedBonus, PercentOfVolume, QualificationStatus, ReferralEarning,
    ReferralEngine, ReferralError, ReferralTier,
};
pub use transaction::{
    AdminAction, AdminCommand, Direction, NewTransaction, PaymentMethod, Transaction,
    TransactionError, TransactionProof, TransactionService, TransactionStatus,
};
pub use withdrawal::{WithdrawalError, WithdrawalRequest, WithdrawalStatus, WithdrawalWorkflow};
