//! paycore - demo digital-wallet backend
//!
//! Users register, receive a seeded balance, and transfer funds to each other
//! by wallet address or 4-digit PAY ID.
//!
//! # Modules
//!
//! - [`money`] - fixed-point amounts (u64 cents)
//! - [`model`] - User, Wallet, and Transaction records
//! - [`store`] - account/ledger repository traits + memory and Postgres backends
//! - [`allocator`] - wallet address and PAY ID allocation
//! - [`engine`] - the transfer engine (validation + atomic balance moves)
//! - [`auth`] - registration, login, JWT sessions
//! - [`gateway`] - axum HTTP API
//! - [`config`] / [`logging`] - YAML config and tracing setup

pub mod allocator;
pub mod auth;
pub mod config;
pub mod engine;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod money;
pub mod store;

// Convenient re-exports at crate root
pub use allocator::{AllocatorError, IdAllocator};
pub use engine::{
    RecipientSelector, TransferEngine, TransferError, TransferOutcome, TransferSpec,
};
pub use model::{PayId, Transaction, TxStatus, User, Wallet, WalletAddress};
pub use money::{Amount, MoneyError};
pub use store::{AccountStore, LedgerStore, StoreError};
