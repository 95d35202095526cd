//! Repository layer for account and ledger persistence
//!
//! The transfer engine and auth service never talk to a concrete database;
//! they depend on the [`AccountStore`] and [`LedgerStore`] traits. Two
//! implementations are provided:
//!
//! - [`memory::MemoryStore`] - mutex-guarded in-process maps (tests, dev)
//! - [`postgres::PgStore`] - sqlx/PostgreSQL (production)

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{PayId, Transaction, User, Wallet, WalletAddress};
use crate::money::Amount;

/// Errors surfaced by the store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("username already taken")]
    UsernameTaken,

    #[error("pay id already assigned")]
    PayIdTaken,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Fields needed to create a User and its Wallet in one unit of work.
///
/// Identifiers and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub pay_id: PayId,
    pub wallet_address: WalletAddress,
    pub seed_balance: Amount,
}

/// Both post-transfer balances, returned from the atomic transfer update.
#[derive(Debug, Clone, Copy)]
pub struct TransferBalances {
    pub sender: Amount,
    pub receiver: Amount,
}

/// Persistence of User and Wallet records.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create the User and its seeded Wallet atomically.
    ///
    /// Fails with [`StoreError::UsernameTaken`] or [`StoreError::PayIdTaken`]
    /// on a uniqueness conflict; callers retry PAY-ID allocation on the
    /// latter.
    async fn create_account(&self, new: NewAccount) -> Result<(User, Wallet), StoreError>;

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>, StoreError>;

    async fn wallet_by_address(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<Wallet>, StoreError>;

    async fn wallet_by_pay_id(&self, pay_id: &PayId) -> Result<Option<Wallet>, StoreError>;

    async fn pay_id_in_use(&self, pay_id: &PayId) -> Result<bool, StoreError>;

    /// Atomically debit `from` and credit `to`.
    ///
    /// The debit is conditional on the sender still holding at least
    /// `amount` at commit time; a concurrent transfer that drained the
    /// balance after the caller's read loses the race and gets
    /// [`StoreError::InsufficientBalance`] with neither wallet touched.
    async fn apply_transfer(
        &self,
        from: &WalletAddress,
        to: &WalletAddress,
        amount: Amount,
    ) -> Result<TransferBalances, StoreError>;
}

/// Append-only collection of completed transfers.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append one immutable transaction record.
    async fn append(&self, tx: Transaction) -> Result<(), StoreError>;

    /// All transactions the wallet participated in, newest first.
    async fn for_wallet(&self, address: &WalletAddress) -> Result<Vec<Transaction>, StoreError>;
}
