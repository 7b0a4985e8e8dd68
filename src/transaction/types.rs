//! Transaction record and command types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::state::TransactionStatus;
use crate::core_types::{BankDetails, TransactionId, UserId};

/// Trade direction. Picks the initial awaiting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// Buy waits on fiat proof, sell waits on crypto proof.
    pub fn initial_status(&self) -> TransactionStatus {
        match self {
            Direction::Buy => TransactionStatus::AwaitingPayment,
            Direction::Sell => TransactionStatus::AwaitingCrypto,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "buy",
            Direction::Sell => "sell",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(Direction::Buy),
            "sell" => Ok(Direction::Sell),
            _ => Err(()),
        }
    }
}

/// How the fiat leg settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Ussd,
    Card,
}

/// User-submitted evidence attached before a transaction can leave its
/// awaiting state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionProof {
    /// Payment screenshot / receipt reference (buy side).
    pub payment_proof: Option<String>,
    /// On-chain transfer hash (sell side).
    pub crypto_tx_hash: Option<String>,
    pub crypto_address: Option<String>,
    pub network: Option<String>,
    pub notes: Option<String>,
}

impl TransactionProof {
    /// Whether this proof satisfies the direction's awaiting state.
    pub fn suffices_for(&self, direction: Direction) -> bool {
        match direction {
            Direction::Buy => self
                .payment_proof
                .as_deref()
                .is_some_and(|p| !p.trim().is_empty()),
            Direction::Sell => self
                .crypto_tx_hash
                .as_deref()
                .is_some_and(|h| !h.trim().is_empty()),
        }
    }
}

/// Parameters for creating a transaction. Fiat amounts in kobo.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub direction: Direction,
    pub asset: String,
    pub asset_amount: Decimal,
    /// Naira per whole asset unit.
    pub rate: Decimal,
    pub fiat_kobo: u64,
    pub fee_kobo: u64,
    pub payment_method: PaymentMethod,
    pub bank_details: Option<BankDetails>,
}

/// A buy/sell crypto transaction. Never hard-deleted; terminal records are
/// retained for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Externally quotable reference, distinct from `id`.
    pub reference: String,
    pub user_id: UserId,
    pub direction: Direction,
    pub asset: String,
    pub asset_amount: Decimal,
    pub rate: Decimal,
    pub fiat_kobo: u64,
    pub fee_kobo: u64,
    pub payment_method: PaymentMethod,
    pub bank_details: Option<BankDetails>,
    pub proof: Option<TransactionProof>,
    pub status: TransactionStatus,
    pub admin_notes: Vec<String>,
    pub failure_reason: Option<String>,
    /// Unix millis.
    pub created_at: i64,
    /// Set iff status is terminal.
    pub completed_at: Option<i64>,
}

impl Transaction {
    pub fn new(req: NewTransaction) -> Self {
        Self {
            id: TransactionId::new(),
            reference: crate::refnum::generate("TXN"),
            user_id: req.user_id,
            direction: req.direction,
            asset: req.asset,
            asset_amount: req.asset_amount,
            rate: req.rate,
            fiat_kobo: req.fiat_kobo,
            fee_kobo: req.fee_kobo,
            payment_method: req.payment_method,
            bank_details: req.bank_details,
            proof: None,
            status: req.direction.initial_status(),
            admin_notes: Vec::new(),
            failure_reason: None,
            created_at: chrono::Utc::now().timestamp_millis(),
            completed_at: None,
        }
    }
}

/// Admin disposition verbs issued against `under_review` (plus hold/resume
/// and cancel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    Approve,
    Reject,
    /// Park in the manual `pending` holding state.
    Hold,
    /// Resume review from `pending`.
    Resume,
    Cancel,
}

impl AdminAction {
    pub fn target_status(&self) -> TransactionStatus {
        match self {
            AdminAction::Approve => TransactionStatus::Completed,
            AdminAction::Reject => TransactionStatus::Failed,
            AdminAction::Hold => TransactionStatus::Pending,
            AdminAction::Resume => TransactionStatus::UnderReview,
            AdminAction::Cancel => TransactionStatus::Cancelled,
        }
    }
}

/// Validated command object for privileged transitions, independent of any
/// presentation layer. The actor is always explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCommand {
    pub action: AdminAction,
    pub actor: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl AdminCommand {
    pub fn new(action: AdminAction, actor: impl Into<String>) -> Self {
        Self {
            action,
            actor: actor.into(),
            reason: None,
            notes: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// A rejection must carry a non-empty failure reason.
    pub fn has_usable_reason(&self) -> bool {
        self.reason.as_deref().is_some_and(|r| !r.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_initial_status() {
        assert_eq!(
            Direction::Buy.initial_status(),
            TransactionStatus::AwaitingPayment
        );
        assert_eq!(
            Direction::Sell.initial_status(),
            TransactionStatus::AwaitingCrypto
        );
    }

    #[test]
    fn test_proof_sufficiency_per_direction() {
        let fiat_proof = TransactionProof {
            payment_proof: Some("receipt-123.png".into()),
            ..Default::default()
        };
        assert!(fiat_proof.suffices_for(Direction::Buy));
        assert!(!fiat_proof.suffices_for(Direction::Sell));

        let chain_proof = TransactionProof {
            crypto_tx_hash: Some("0xabc".into()),
            ..Default::default()
        };
        assert!(chain_proof.suffices_for(Direction::Sell));
        assert!(!chain_proof.suffices_for(Direction::Buy));

        let blank = TransactionProof {
            payment_proof: Some("   ".into()),
            ..Default::default()
        };
        assert!(!blank.suffices_for(Direction::Buy));
    }

    #[test]
    fn test_admin_command_reason_check() {
        let cmd = AdminCommand::new(AdminAction::Reject, "admin@desk");
        assert!(!cmd.has_usable_reason());
        assert!(!cmd.clone().with_reason("  ").has_usable_reason());
        assert!(cmd.with_reason("proof mismatch").has_usable_reason());
    }
}
