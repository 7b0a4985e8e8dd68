//! Response envelope and error-code mapping.

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

use crate::referral::ReferralError;
use crate::transaction::TransactionError;
use crate::withdrawal::WithdrawalError;

/// API wrapper for standard response format
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            data: Some(data),
            msg: None,
        }
    }

    pub fn error(code: i32, msg: impl ToString) -> Self {
        Self {
            code,
            data: None,
            msg: Some(msg.to_string()),
        }
    }
}

pub mod error_codes {
    pub const INVALID_PARAMETER: i32 = -1001;
    pub const BELOW_MINIMUM: i32 = -1002;
    pub const INVALID_BANK_DETAILS: i32 = -1003;
    pub const MISSING_REASON: i32 = -1004;
    pub const PROOF_INCOMPLETE: i32 = -1005;
    pub const INSUFFICIENT_BALANCE: i32 = -2001;
    pub const INVALID_TRANSITION: i32 = -3001;
    pub const ALREADY_REFERRED: i32 = -3002;
    pub const SERVICE_UNAVAILABLE: i32 = -5001;
    pub const NOT_FOUND: i32 = -6001;
}

/// Error half of every handler's return type.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn to_api_error(status: u16, code: i32, msg: String) -> ApiError {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiResponse::error(code, msg)))
}

pub fn bad_request(msg: impl ToString) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(
            error_codes::INVALID_PARAMETER,
            msg.to_string(),
        )),
    )
}

pub fn map_withdrawal_error(e: WithdrawalError) -> ApiError {
    let code = match &e {
        WithdrawalError::BelowMinimum { .. } => error_codes::BELOW_MINIMUM,
        WithdrawalError::InvalidBankDetails => error_codes::INVALID_BANK_DETAILS,
        WithdrawalError::InsufficientBalance => error_codes::INSUFFICIENT_BALANCE,
        WithdrawalError::InvalidTransition { .. } => error_codes::INVALID_TRANSITION,
        WithdrawalError::MissingRejectionReason => error_codes::MISSING_REASON,
        WithdrawalError::NotFound(_) => error_codes::NOT_FOUND,
        WithdrawalError::Ledger(_) => error_codes::SERVICE_UNAVAILABLE,
    };
    to_api_error(e.http_status(), code, e.to_string())
}

pub fn map_transaction_error(e: TransactionError) -> ApiError {
    let code = match &e {
        TransactionError::NotFound(_) => error_codes::NOT_FOUND,
        TransactionError::InvalidTransition { .. } => error_codes::INVALID_TRANSITION,
        TransactionError::MissingFailureReason => error_codes::MISSING_REASON,
        TransactionError::ProofIncomplete => error_codes::PROOF_INCOMPLETE,
    };
    to_api_error(e.http_status(), code, e.to_string())
}

pub fn map_referral_error(e: ReferralError) -> ApiError {
    let code = match &e {
        ReferralError::AlreadyReferred(_) => error_codes::ALREADY_REFERRED,
        ReferralError::NotFound(_) => error_codes::NOT_FOUND,
        ReferralError::Ledger(_) => error_codes::SERVICE_UNAVAILABLE,
    };
    to_api_error(e.http_status(), code, e.to_string())
}
