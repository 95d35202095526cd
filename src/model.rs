//! Data models for users, wallets, and ledger transactions

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::money::Amount;

/// Opaque unique identifier of a wallet's funds-holding record.
///
/// High-entropy (UUID v4, hyphenated); shared freely with counterparties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Generate a fresh random address.
    pub fn generate() -> Self {
        WalletAddress(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(s: String) -> Self {
        WalletAddress(s)
    }
}

impl From<&str> for WalletAddress {
    fn from(s: &str) -> Self {
        WalletAddress(s.to_string())
    }
}

/// Human-shareable 4-digit alias for a wallet ("1000".."9999").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayId(String);

impl PayId {
    /// Build from a numeric draw, zero-padded to 4 digits.
    pub fn from_number(n: u16) -> Self {
        PayId(format!("{:04}", n))
    }

    /// Wrap a client-supplied string for lookup without shape validation.
    ///
    /// A malformed value simply matches no wallet.
    pub fn lookup(s: &str) -> Self {
        PayId(s.to_string())
    }

    /// Accept a client-provided PAY ID if it has the 4-digit shape.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
            Some(PayId(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registered account holder.
///
/// Immutable after registration. The argon2 hash never leaves the store
/// layer; API-facing views are built from selected fields only.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub pay_id: PayId,
    pub created_at: DateTime<Utc>,
}

/// Funds-holding record, 1:1 with its owning [`User`].
///
/// Created atomically with the user at registration, seeded with the
/// configured starting balance. The balance is mutated only by the transfer
/// engine.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    #[schema(value_type = String, format = Uuid)]
    pub user_id: Uuid,
    #[schema(value_type = String)]
    pub wallet_address: WalletAddress,
    #[schema(value_type = String, example = "4271")]
    pub pay_id: PayId,
    #[schema(value_type = String, example = "100.00")]
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
}

/// Ledger entry status.
///
/// The transfer engine only ever produces `Completed`; a transaction either
/// commits fully or is rejected before any balance moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Completed,
}

/// Immutable ledger entry describing one completed transfer.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub sender_wallet_address: WalletAddress,
    #[schema(value_type = String)]
    pub receiver_wallet_address: WalletAddress,
    #[schema(value_type = String, example = "4271")]
    pub sender_pay_id: PayId,
    #[schema(value_type = String, example = "8356")]
    pub receiver_pay_id: PayId,
    #[schema(value_type = String, example = "42.75")]
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub status: TxStatus,
}

impl Transaction {
    /// Record a completed transfer between two distinct wallets.
    pub fn completed(sender: &Wallet, receiver: &Wallet, amount: Amount) -> Self {
        Transaction {
            id: Uuid::new_v4(),
            sender_wallet_address: sender.wallet_address.clone(),
            receiver_wallet_address: receiver.wallet_address.clone(),
            sender_pay_id: sender.pay_id.clone(),
            receiver_pay_id: receiver.pay_id.clone(),
            amount,
            timestamp: Utc::now(),
            status: TxStatus::Completed,
        }
    }

    /// Whether the given wallet participated in this transfer.
    pub fn involves(&self, address: &WalletAddress) -> bool {
        &self.sender_wallet_address == address || &self.receiver_wallet_address == address
    }
}
