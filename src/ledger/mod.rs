//! LedgerStore - durable per-user balance records
//!
//! Keyed balance store with single-locked-operation reservation semantics.
//! Every mutation appends to the [`AuditTrail`](crate::audit::AuditTrail).

mod store;

pub use store::{LedgerError, LedgerStore, Reservation};
