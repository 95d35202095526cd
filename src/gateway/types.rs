//! API response envelope, error codes, and request/response DTOs
//!
//! All endpoints answer with the unified `ApiResponse { code, msg, data }`
//! envelope. Wire field names are camelCase to match the original client
//! contract; money values travel as 2-decimal strings.

use axum::Json;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::{PayId, Transaction, User, WalletAddress};
use crate::money::Amount;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Error half of every handler result.
pub type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

/// Standard handler result: enveloped payload or enveloped error.
pub type HandlerResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ErrorResponse>;

/// 200 with a success envelope.
pub fn ok<T>(data: T) -> HandlerResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// 201 with a success envelope.
pub fn created<T>(data: T) -> HandlerResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

/// Build the error half of a handler result.
pub fn reject(status: StatusCode, code: i32, msg: impl Into<String>) -> ErrorResponse {
    (status, Json(ApiResponse::<()>::error(code, msg)))
}

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const SELF_TRANSFER: i32 = 1003;
    pub const USER_EXISTS: i32 = 1004;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;

    // Resource errors (4xxx)
    pub const RECIPIENT_NOT_FOUND: i32 = 4001;
    pub const WALLET_NOT_FOUND: i32 = 4002;
    pub const USER_NOT_FOUND: i32 = 4003;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const ID_SPACE_EXHAUSTED: i32 = 5002;
}

// ============================================================================
// Request DTOs
// ============================================================================

/// User registration request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "satoshi")]
    pub username: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
}

/// User login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "satoshi")]
    pub username: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
}

/// Transfer request
///
/// Exactly one of `receiverWalletAddress` / `receiverPayId` selects the
/// recipient. The amount accepts a JSON string or number; precision beyond 2
/// decimals is rejected downstream, never truncated.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// Transfer amount, e.g. "42.75"
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "42.75")]
    pub amount: Option<Decimal>,
    /// Recipient wallet address (mutually exclusive with receiverPayId)
    #[serde(default)]
    pub receiver_wallet_address: Option<String>,
    /// Recipient 4-digit PAY ID (mutually exclusive with receiverWalletAddress)
    #[serde(default)]
    #[schema(example = "4271")]
    pub receiver_pay_id: Option<String>,
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Session token issued at registration and login
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Current-user view: everything except the password hash
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub username: String,
    #[schema(value_type = String, example = "4271")]
    pub pay_id: PayId,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id,
            username: user.username,
            pay_id: user.pay_id,
            created_at: user.created_at,
        }
    }
}

/// Limited recipient preview returned by the PAY-ID lookup
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipientPreview {
    pub username: String,
    #[schema(value_type = String, example = "4271")]
    pub pay_id: PayId,
    #[schema(value_type = String)]
    pub wallet_address: WalletAddress,
}

/// Transfer response: the ledger entry plus both updated balances
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponseData {
    pub transaction: Transaction,
    #[schema(value_type = String, example = "57.25")]
    pub sender_balance: Amount,
    #[schema(value_type = String, example = "52.75")]
    pub receiver_balance: Amount,
}

/// Wallet QR code as a PNG data URL
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrResponse {
    #[schema(example = "data:image/png;base64,...")]
    pub qr_code: String,
}

/// Health check response data
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub uptime_secs: u64,
}

/// Decoded recipient selector, enforcing mutual exclusivity.
pub fn recipient_selector(
    request: &CreateTransactionRequest,
) -> Result<crate::engine::RecipientSelector, &'static str> {
    use crate::engine::RecipientSelector;

    match (&request.receiver_wallet_address, &request.receiver_pay_id) {
        (Some(_), Some(_)) => {
            Err("Provide either a wallet address or a PAY ID, not both")
        }
        (Some(address), None) => Ok(RecipientSelector::Address(WalletAddress::from(
            address.as_str(),
        ))),
        (None, Some(pay_id)) => Ok(RecipientSelector::PayId(PayId::lookup(pay_id))),
        (None, None) => Err("Please provide either a wallet address or PAY ID"),
    }
}
