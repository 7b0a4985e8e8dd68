//! HTTP handlers.
//!
//! Amounts cross the wire as strings to avoid float precision issues; the
//! money module converts them to kobo. Every privileged request names its
//! actor explicitly.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::state::AppState;
use super::types::{
    ApiError, ApiResponse, bad_request, map_referral_error, map_transaction_error,
    map_withdrawal_error,
};
use crate::audit::{AuditEntry, EntityKind};
use crate::balance::BalanceSnapshot;
use crate::core_types::{BankDetails, TransactionId, UserId, WithdrawalId};
use crate::money::{parse_naira, parse_naira_allow_zero};
use crate::referral::{ReferralEarning, ReferralTier};
use crate::transaction::{
    AdminAction, AdminCommand, Direction, NewTransaction, PaymentMethod, Transaction,
    TransactionProof,
};
use crate::withdrawal::WithdrawalRequest;

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    pub user_id: UserId,
    /// "buy" or "sell"
    pub direction: String,
    #[validate(length(min = 1, max = 16))]
    pub asset: String,
    /// Asset quantity as string (e.g. "0.005")
    pub asset_amount: String,
    /// Naira per asset unit as string
    pub rate: String,
    /// Fiat leg in naira as string
    pub fiat_amount: String,
    /// Fee in naira; defaults to zero
    pub fee: Option<String>,
    /// "bank_transfer" | "ussd" | "card"
    pub payment_method: String,
    pub bank_details: Option<BankDetailsDto>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BankDetailsDto {
    #[validate(length(min = 1))]
    pub account_name: String,
    #[validate(length(min = 10, max = 10))]
    pub account_number: String,
    #[validate(length(min = 1))]
    pub bank_name: String,
}

impl From<BankDetailsDto> for BankDetails {
    fn from(dto: BankDetailsDto) -> Self {
        BankDetails::new(dto.account_name, dto.account_number, dto.bank_name)
    }
}

#[derive(Debug, Deserialize)]
pub struct AttachProofRequest {
    pub payment_proof: Option<String>,
    pub crypto_tx_hash: Option<String>,
    pub crypto_address: Option<String>,
    pub network: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransactionStatusRequest {
    /// "approve" | "reject" | "hold" | "resume" | "cancel"
    pub action: String,
    #[validate(length(min = 1))]
    pub actor: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWithdrawalRequest {
    pub user_id: UserId,
    /// Naira as string
    pub amount: String,
    #[validate(nested)]
    pub bank_details: BankDetailsDto,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminActionRequest {
    #[validate(length(min = 1))]
    pub actor: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnnotateRequest {
    #[validate(length(min = 1))]
    pub actor: String,
    #[validate(length(min = 1))]
    pub note: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterReferralRequest {
    pub referrer: UserId,
    pub referred_user: UserId,
    #[validate(length(min = 1))]
    pub referred_name: String,
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ReferralsResponse {
    pub tier: ReferralTier,
    pub earnings: Vec<ReferralEarning>,
}

// ============================================================================
// Handlers
// ============================================================================

fn parse_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| bad_request(format!("malformed id: {raw}")))
}

/// POST /api/v1/transactions
async fn create_transaction(
    State(state): State<AppState>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    req.validate().map_err(bad_request)?;

    let direction = Direction::from_str(&req.direction)
        .map_err(|_| bad_request("direction must be 'buy' or 'sell'"))?;
    let payment_method = match req.payment_method.as_str() {
        "bank_transfer" => PaymentMethod::BankTransfer,
        "ussd" => PaymentMethod::Ussd,
        "card" => PaymentMethod::Card,
        other => return Err(bad_request(format!("unknown payment method: {other}"))),
    };
    let asset_amount = Decimal::from_str(&req.asset_amount)
        .map_err(|_| bad_request("invalid asset amount"))?;
    let rate = Decimal::from_str(&req.rate).map_err(|_| bad_request("invalid rate"))?;
    let fiat_kobo = parse_naira(&req.fiat_amount).map_err(bad_request)?;
    // Zero is a valid fee; only the fiat leg must be positive
    let fee_kobo = match &req.fee {
        Some(fee) => parse_naira_allow_zero(fee).map_err(bad_request)?,
        None => 0,
    };

    let tx = state.transactions.create(NewTransaction {
        user_id: req.user_id,
        direction,
        asset: req.asset,
        asset_amount,
        rate,
        fiat_kobo,
        fee_kobo,
        payment_method,
        bank_details: req.bank_details.map(Into::into),
    });
    Ok(Json(ApiResponse::success(tx)))
}

/// POST /api/v1/transactions/{id}/proof
async fn attach_proof(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AttachProofRequest>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let id: TransactionId = parse_id(&id)?;
    let proof = TransactionProof {
        payment_proof: req.payment_proof,
        crypto_tx_hash: req.crypto_tx_hash,
        crypto_address: req.crypto_address,
        network: req.network,
        notes: req.notes,
    };
    let tx = state
        .transactions
        .attach_proof(id, proof)
        .map_err(map_transaction_error)?;
    Ok(Json(ApiResponse::success(tx)))
}

/// POST /api/v1/transactions/{id}/status
async fn dispose_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TransactionStatusRequest>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    req.validate().map_err(bad_request)?;
    let id: TransactionId = parse_id(&id)?;

    let action = match req.action.as_str() {
        "approve" => AdminAction::Approve,
        "reject" => AdminAction::Reject,
        "hold" => AdminAction::Hold,
        "resume" => AdminAction::Resume,
        "cancel" => AdminAction::Cancel,
        other => return Err(bad_request(format!("unknown action: {other}"))),
    };
    let cmd = AdminCommand {
        action,
        actor: req.actor,
        reason: req.reason,
        notes: req.notes,
    };

    let tx = state
        .transactions
        .dispose(id, cmd)
        .map_err(map_transaction_error)?;
    Ok(Json(ApiResponse::success(tx)))
}

/// POST /api/v1/transactions/{id}/annotate
///
/// Note-only: never changes status, so it is the one admin action terminal
/// transactions still accept.
async fn annotate_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AnnotateRequest>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    req.validate().map_err(bad_request)?;
    let id: TransactionId = parse_id(&id)?;
    let tx = state
        .transactions
        .annotate(id, &req.actor, &req.note)
        .map_err(map_transaction_error)?;
    Ok(Json(ApiResponse::success(tx)))
}

/// GET /api/v1/transactions/user/{user_id}
async fn list_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Json<ApiResponse<Vec<Transaction>>> {
    Json(ApiResponse::success(state.transactions.list_for(user_id)))
}

/// POST /api/v1/withdrawals
async fn create_withdrawal(
    State(state): State<AppState>,
    Json(req): Json<CreateWithdrawalRequest>,
) -> Result<Json<ApiResponse<WithdrawalRequest>>, ApiError> {
    req.validate().map_err(bad_request)?;
    let amount_kobo = parse_naira(&req.amount).map_err(bad_request)?;

    let request = state
        .withdrawals
        .request(req.user_id, amount_kobo, req.bank_details.into())
        .map_err(map_withdrawal_error)?;
    Ok(Json(ApiResponse::success(request)))
}

/// POST /api/v1/withdrawals/{id}/approve
async fn approve_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AdminActionRequest>,
) -> Result<Json<ApiResponse<WithdrawalRequest>>, ApiError> {
    req.validate().map_err(bad_request)?;
    let id: WithdrawalId = parse_id(&id)?;
    let request = state
        .withdrawals
        .approve(id, &req.actor)
        .map_err(map_withdrawal_error)?;
    Ok(Json(ApiResponse::success(request)))
}

/// POST /api/v1/withdrawals/{id}/reject
async fn reject_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AdminActionRequest>,
) -> Result<Json<ApiResponse<WithdrawalRequest>>, ApiError> {
    req.validate().map_err(bad_request)?;
    let id: WithdrawalId = parse_id(&id)?;
    let reason = req.reason.as_deref().unwrap_or_default();
    let request = state
        .withdrawals
        .reject(id, &req.actor, reason)
        .map_err(map_withdrawal_error)?;
    Ok(Json(ApiResponse::success(request)))
}

/// POST /api/v1/withdrawals/{id}/pay
async fn pay_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AdminActionRequest>,
) -> Result<Json<ApiResponse<WithdrawalRequest>>, ApiError> {
    req.validate().map_err(bad_request)?;
    let id: WithdrawalId = parse_id(&id)?;
    let request = state
        .withdrawals
        .mark_paid(id, &req.actor)
        .map_err(map_withdrawal_error)?;
    Ok(Json(ApiResponse::success(request)))
}

/// POST /api/v1/withdrawals/{id}/annotate
async fn annotate_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AnnotateRequest>,
) -> Result<Json<ApiResponse<WithdrawalRequest>>, ApiError> {
    req.validate().map_err(bad_request)?;
    let id: WithdrawalId = parse_id(&id)?;
    let request = state
        .withdrawals
        .annotate(id, &req.actor, &req.note)
        .map_err(map_withdrawal_error)?;
    Ok(Json(ApiResponse::success(request)))
}

/// GET /api/v1/withdrawals/user/{user_id}
async fn list_withdrawals(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Json<ApiResponse<Vec<WithdrawalRequest>>> {
    Json(ApiResponse::success(state.withdrawals.list_for(user_id)))
}

/// GET /api/v1/ledger/{user_id}
async fn get_ledger(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Json<ApiResponse<BalanceSnapshot>> {
    Json(ApiResponse::success(state.ledger.get_balance(user_id)))
}

/// POST /api/v1/referrals
async fn register_referral(
    State(state): State<AppState>,
    Json(req): Json<RegisterReferralRequest>,
) -> Result<Json<ApiResponse<ReferralEarning>>, ApiError> {
    req.validate().map_err(bad_request)?;
    let earning = state
        .referrals
        .register_referral(req.referrer, req.referred_user, &req.referred_name)
        .map_err(map_referral_error)?;
    Ok(Json(ApiResponse::success(earning)))
}

/// GET /api/v1/referrals/{user_id}
async fn get_referrals(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Json<ApiResponse<ReferralsResponse>> {
    Json(ApiResponse::success(ReferralsResponse {
        tier: state.referrals.tier_for(user_id),
        earnings: state.referrals.list_for(user_id),
    }))
}

/// GET /api/v1/audit/{kind}/{id}
async fn get_audit(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<AuditEntry>>>, ApiError> {
    let kind: EntityKind = kind
        .parse()
        .map_err(|_| bad_request(format!("unknown entity kind: {kind}")))?;
    Ok(Json(ApiResponse::success(state.audit.entries_for(kind, &id))))
}

/// Build the full API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/transactions", post(create_transaction))
        .route("/api/v1/transactions/{id}/proof", post(attach_proof))
        .route("/api/v1/transactions/{id}/status", post(dispose_transaction))
        .route(
            "/api/v1/transactions/{id}/annotate",
            post(annotate_transaction),
        )
        .route("/api/v1/transactions/user/{user_id}", get(list_transactions))
        .route("/api/v1/withdrawals", post(create_withdrawal))
        .route("/api/v1/withdrawals/{id}/approve", post(approve_withdrawal))
        .route("/api/v1/withdrawals/{id}/reject", post(reject_withdrawal))
        .route("/api/v1/withdrawals/{id}/pay", post(pay_withdrawal))
        .route(
            "/api/v1/withdrawals/{id}/annotate",
            post(annotate_withdrawal),
        )
        .route("/api/v1/withdrawals/user/{user_id}", get(list_withdrawals))
        .route("/api/v1/ledger/{user_id}", get(get_ledger))
        .route("/api/v1/referrals", post(register_referral))
        .route("/api/v1/referrals/{user_id}", get(get_referrals))
        .route("/api/v1/audit/{kind}/{id}", get(get_audit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::transaction::TransactionStatus;
    use axum::http::StatusCode;

    fn state() -> AppState {
        AppState::build(&EngineConfig::default())
    }

    fn buy_request(fee: Option<&str>) -> CreateTransactionRequest {
        CreateTransactionRequest {
            user_id: 1,
            direction: "buy".into(),
            asset: "BTC".into(),
            asset_amount: "0.005".into(),
            rate: "17000000".into(),
            fiat_amount: "85000".into(),
            fee: fee.map(str::to_string),
            payment_method: "bank_transfer".into(),
            bank_details: None,
        }
    }

    fn note(text: &str) -> AnnotateRequest {
        AnnotateRequest {
            actor: "admin@desk".into(),
            note: text.into(),
        }
    }

    #[tokio::test]
    async fn test_explicit_zero_fee_accepted() {
        let s = state();
        let Json(resp) = create_transaction(State(s), Json(buy_request(Some("0"))))
            .await
            .unwrap();
        assert_eq!(resp.data.unwrap().fee_kobo, 0);
    }

    #[tokio::test]
    async fn test_annotate_terminal_transaction() {
        let s = state();
        let Json(created) = create_transaction(State(s.clone()), Json(buy_request(None)))
            .await
            .unwrap();
        let tx = created.data.unwrap();
        let proof = TransactionProof {
            payment_proof: Some("receipt.png".into()),
            ..Default::default()
        };
        s.transactions.attach_proof(tx.id, proof).unwrap();
        s.transactions
            .dispose(tx.id, AdminCommand::new(AdminAction::Approve, "admin@desk"))
            .unwrap();

        let Json(resp) = annotate_transaction(
            State(s),
            Path(tx.id.to_string()),
            Json(note("settled late")),
        )
        .await
        .unwrap();
        let noted = resp.data.unwrap();
        assert_eq!(noted.status, TransactionStatus::Completed);
        assert_eq!(noted.admin_notes, vec!["settled late".to_string()]);
    }

    #[tokio::test]
    async fn test_annotate_withdrawal() {
        let s = state();
        s.ledger.credit_earned(1, 1_000_000, "promo").unwrap();
        let bank = BankDetails::new("Ada Obi", "0123456789", "GTBank");
        let req = s.withdrawals.request(1, 400_000, bank).unwrap();

        let Json(resp) = annotate_withdrawal(
            State(s),
            Path(req.id.to_string()),
            Json(note("user notified")),
        )
        .await
        .unwrap();
        assert_eq!(
            resp.data.unwrap().admin_notes,
            vec!["user notified".to_string()]
        );
    }

    #[tokio::test]
    async fn test_annotate_rejects_blank_note() {
        let s = state();
        let (status, _) = annotate_transaction(
            State(s),
            Path(TransactionId::new().to_string()),
            Json(note("")),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
