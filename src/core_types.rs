//! Core types used throughout the engine.
//!
//! Identifier newtypes and the small shared records every domain module
//! needs. Entity ids are ULIDs: monotonic, sortable, and generated without
//! coordination.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User ID - globally unique, immutable after assignment.
///
/// Issued by the account system, which is outside this engine. Used as the
/// key for balance and entity lookups.
pub type UserId = u64;

macro_rules! ulid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(ulid::Ulid);

        impl $name {
            /// Generate a new unique id.
            pub fn new() -> Self {
                Self(ulid::Ulid::new())
            }

            /// Get the inner ULID value.
            pub fn inner(&self) -> ulid::Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(ulid::Ulid::from_string(s)?))
            }
        }
    };
}

ulid_id! {
    /// Primary key for a buy/sell transaction.
    TransactionId
}

ulid_id! {
    /// Primary key for a withdrawal request.
    WithdrawalId
}

ulid_id! {
    /// Primary key for a referral earning record.
    EarningId
}

/// Destination bank account for fiat payouts.
///
/// All three fields must be non-empty before the engine accepts the details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
}

impl BankDetails {
    pub fn new(
        account_name: impl Into<String>,
        account_number: impl Into<String>,
        bank_name: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            account_number: account_number.into(),
            bank_name: bank_name.into(),
        }
    }

    /// True when every field carries a usable value.
    pub fn is_complete(&self) -> bool {
        !self.account_name.trim().is_empty()
            && !self.account_number.trim().is_empty()
            && !self.bank_name.trim().is_empty()
    }
}
