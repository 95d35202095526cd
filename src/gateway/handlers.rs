//! HTTP handlers for the wallet API
//!
//! Thin layer over the auth service and transfer engine: decode the request,
//! call the service, map typed errors onto HTTP statuses and stable error
//! codes. Business rules live below this layer.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AuthError, Claims};
use crate::engine::{TransferError, TransferSpec};
use crate::model::{PayId, Transaction, Wallet, WalletAddress};
use crate::store::StoreError;

use super::qr;
use super::state::AppState;
use super::types::{
    ApiResponse, CreateTransactionRequest, ErrorResponse, HandlerResult, HealthResponse,
    LoginRequest, QrResponse, RecipientPreview, RegisterRequest, TokenResponse,
    TransferResponseData, UserProfile, created, error_codes, ok, recipient_selector, reject,
};

// ============================================================================
// Error mapping
// ============================================================================

fn auth_error(e: AuthError) -> ErrorResponse {
    match e {
        AuthError::UsernameTooShort | AuthError::PasswordTooShort => reject(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            e.to_string(),
        ),
        AuthError::UserExists => reject(
            StatusCode::BAD_REQUEST,
            error_codes::USER_EXISTS,
            "User already exists",
        ),
        AuthError::InvalidCredentials => reject(
            StatusCode::BAD_REQUEST,
            error_codes::AUTH_FAILED,
            "Invalid credentials",
        ),
        AuthError::IdSpaceExhausted => {
            tracing::error!("registration failed: PAY ID space exhausted");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::ID_SPACE_EXHAUSTED,
                "No free PAY ID available",
            )
        }
        AuthError::Hashing(_) | AuthError::Token(_) | AuthError::Storage(_) => {
            tracing::error!("auth failure: {e}");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "Internal server error",
            )
        }
    }
}

fn transfer_error(e: TransferError) -> ErrorResponse {
    match &e {
        TransferError::InvalidAmount => reject(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            e.to_string(),
        ),
        TransferError::SenderWalletNotFound => reject(
            StatusCode::BAD_REQUEST,
            error_codes::WALLET_NOT_FOUND,
            "No wallet found for this user",
        ),
        // The message carries both figures for client display.
        TransferError::InsufficientBalance { .. } => reject(
            StatusCode::BAD_REQUEST,
            error_codes::INSUFFICIENT_BALANCE,
            e.to_string(),
        ),
        TransferError::RecipientNotFound => reject(
            StatusCode::NOT_FOUND,
            error_codes::RECIPIENT_NOT_FOUND,
            "Recipient not found",
        ),
        TransferError::SelfTransfer => reject(
            StatusCode::BAD_REQUEST,
            error_codes::SELF_TRANSFER,
            "Cannot send funds to yourself",
        ),
        TransferError::Storage(inner) => {
            tracing::error!("transfer storage failure: {inner}");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "Failed to process transaction",
            )
        }
    }
}

fn store_error(e: StoreError) -> ErrorResponse {
    tracing::error!("store failure: {e}");
    reject(
        StatusCode::INTERNAL_SERVER_ERROR,
        error_codes::INTERNAL_ERROR,
        "Internal server error",
    )
}

fn claims_user_id(claims: &Claims) -> Result<Uuid, ErrorResponse> {
    claims.user_id().ok_or_else(|| {
        reject(
            StatusCode::UNAUTHORIZED,
            error_codes::AUTH_FAILED,
            "Invalid user ID in token",
        )
    })
}

async fn wallet_of(state: &AppState, user_id: Uuid) -> Result<Wallet, ErrorResponse> {
    state
        .accounts
        .wallet_by_user(user_id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| {
            reject(
                StatusCode::NOT_FOUND,
                error_codes::WALLET_NOT_FOUND,
                "No wallet found for this user",
            )
        })
}

// ============================================================================
// Public handlers
// ============================================================================

/// Root liveness probe
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up")),
    tag = "System"
)]
pub async fn root_check() -> (StatusCode, Json<ApiResponse<&'static str>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::success("PAY API server is running")),
    )
}

/// Health check with uptime
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service healthy", body = ApiResponse<HealthResponse>)
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::success(HealthResponse {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            uptime_secs: state.uptime_secs(),
        })),
    )
}

/// Register a new user
///
/// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered, wallet seeded", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid input or user already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> HandlerResult<TokenResponse> {
    match state.auth.register(&req.username, &req.password).await {
        Ok(account) => {
            tracing::info!(user_id = %account.user.id, "user registered");
            created(TokenResponse {
                token: account.token,
            })
        }
        Err(e) => {
            tracing::warn!(username = %req.username, "registration rejected: {e}");
            Err(auth_error(e))
        }
    }
}

/// Login and get a session token
///
/// POST /api/auth
#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> HandlerResult<TokenResponse> {
    match state.auth.login(&req.username, &req.password).await {
        Ok((_, token)) => ok(TokenResponse { token }),
        Err(e) => {
            tracing::warn!(username = %req.username, "login rejected: {e}");
            Err(auth_error(e))
        }
    }
}

// ============================================================================
// Authenticated handlers
// ============================================================================

/// Current user from the session token
///
/// GET /api/auth
#[utoipa::path(
    get,
    path = "/api/auth",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    tag = "Auth"
)]
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> HandlerResult<UserProfile> {
    let user_id = claims_user_id(&claims)?;
    let user = state
        .accounts
        .user_by_id(user_id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| {
            reject(
                StatusCode::NOT_FOUND,
                error_codes::USER_NOT_FOUND,
                "User not found",
            )
        })?;
    ok(UserProfile::from(user))
}

/// Current user's wallet
///
/// GET /api/wallets
#[utoipa::path(
    get,
    path = "/api/wallets",
    responses(
        (status = 200, description = "Caller's wallet", body = ApiResponse<Wallet>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No wallet for this user")
    ),
    tag = "Wallet"
)]
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> HandlerResult<Wallet> {
    let user_id = claims_user_id(&claims)?;
    let wallet = wallet_of(&state, user_id).await?;
    ok(wallet)
}

/// QR code for the caller's wallet
///
/// GET /api/wallets/generate-qr
#[utoipa::path(
    get,
    path = "/api/wallets/generate-qr",
    responses(
        (status = 200, description = "PNG data URL", body = ApiResponse<QrResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "QR generation failed")
    ),
    tag = "Wallet"
)]
pub async fn generate_qr(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> HandlerResult<QrResponse> {
    let user_id = claims_user_id(&claims)?;
    let wallet = wallet_of(&state, user_id).await?;

    match qr::wallet_qr_data_url(&wallet) {
        Ok(qr_code) => ok(QrResponse { qr_code }),
        Err(e) => {
            tracing::error!("QR generation failed: {e:#}");
            Err(reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "Failed to generate QR code",
            ))
        }
    }
}

/// Wallet by address
///
/// GET /api/wallets/address/{address}
#[utoipa::path(
    get,
    path = "/api/wallets/address/{address}",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Wallet", body = ApiResponse<Wallet>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found")
    ),
    tag = "Wallet"
)]
pub async fn wallet_by_address(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(address): Path<String>,
) -> HandlerResult<Wallet> {
    claims_user_id(&claims)?;
    let wallet = state
        .accounts
        .wallet_by_address(&WalletAddress::from(address.as_str()))
        .await
        .map_err(store_error)?
        .ok_or_else(|| {
            reject(
                StatusCode::NOT_FOUND,
                error_codes::WALLET_NOT_FOUND,
                "Wallet not found",
            )
        })?;
    ok(wallet)
}

/// Recipient preview by PAY ID
///
/// GET /api/users/find/{pay_id}
///
/// Returns only what a sender needs to confirm the recipient; nothing
/// sensitive.
#[utoipa::path(
    get,
    path = "/api/users/find/{pay_id}",
    params(("pay_id" = String, Path, description = "4-digit PAY ID")),
    responses(
        (status = 200, description = "Recipient preview", body = ApiResponse<RecipientPreview>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn find_by_pay_id(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(pay_id): Path<String>,
) -> HandlerResult<RecipientPreview> {
    claims_user_id(&claims)?;

    let not_found = || {
        reject(
            StatusCode::NOT_FOUND,
            error_codes::USER_NOT_FOUND,
            "User not found",
        )
    };

    let wallet = state
        .accounts
        .wallet_by_pay_id(&PayId::lookup(&pay_id))
        .await
        .map_err(store_error)?
        .ok_or_else(not_found)?;
    let user = state
        .accounts
        .user_by_id(wallet.user_id)
        .await
        .map_err(store_error)?
        .ok_or_else(not_found)?;

    ok(RecipientPreview {
        username: user.username,
        pay_id: user.pay_id,
        wallet_address: wallet.wallet_address,
    })
}

/// Transactions the caller participated in, newest first
///
/// GET /api/transactions
#[utoipa::path(
    get,
    path = "/api/transactions",
    responses(
        (status = 200, description = "Transaction history", body = ApiResponse<Vec<Transaction>>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No wallet for this user")
    ),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> HandlerResult<Vec<Transaction>> {
    let user_id = claims_user_id(&claims)?;
    let wallet = wallet_of(&state, user_id).await?;
    let transactions = state
        .ledger
        .for_wallet(&wallet.wallet_address)
        .await
        .map_err(store_error)?;
    ok(transactions)
}

/// Execute a transfer
///
/// POST /api/transactions
#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 200, description = "Transfer completed", body = ApiResponse<TransferResponseData>),
        (status = 400, description = "Invalid amount, insufficient balance, or self-send"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipient not found"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Transactions"
)]
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTransactionRequest>,
) -> HandlerResult<TransferResponseData> {
    let user_id = claims_user_id(&claims)?;

    let recipient = recipient_selector(&req).map_err(|msg| {
        reject(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    })?;

    let spec = TransferSpec {
        amount: req.amount,
        recipient,
    };

    match state.engine.transfer(user_id, spec).await {
        Ok(outcome) => {
            tracing::info!(
                transaction_id = %outcome.transaction.id,
                amount = %outcome.transaction.amount,
                "transfer completed"
            );
            ok(TransferResponseData {
                transaction: outcome.transaction,
                sender_balance: outcome.sender_balance,
                receiver_balance: outcome.receiver_balance,
            })
        }
        Err(e) => Err(transfer_error(e)),
    }
}
