//! In-memory store
//!
//! Mutex-guarded maps standing in for the database in tests and local
//! development. One lock guards the whole account set, so the conditional
//! re-check inside [`MemoryStore::apply_transfer`] and both balance writes
//! happen under a single critical section, which is what makes the
//! check-then-act on balances safe under concurrent transfers.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::model::{PayId, Transaction, User, Wallet, WalletAddress};
use crate::money::Amount;

use super::{AccountStore, LedgerStore, NewAccount, StoreError, TransferBalances};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    wallets: HashMap<Uuid, Wallet>,
    /// wallet_address -> wallet id
    by_address: HashMap<WalletAddress, Uuid>,
    /// pay_id -> wallet id
    by_pay_id: HashMap<PayId, Uuid>,
    transactions: Vec<Transaction>,
}

/// In-process implementation of both store traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panic mid-mutation; treat the store as gone.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(&self, new: NewAccount) -> Result<(User, Wallet), StoreError> {
        let mut inner = self.lock();

        if inner.users.values().any(|u| u.username == new.username) {
            return Err(StoreError::UsernameTaken);
        }
        if inner.by_pay_id.contains_key(&new.pay_id) {
            return Err(StoreError::PayIdTaken);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            password_hash: new.password_hash,
            pay_id: new.pay_id.clone(),
            created_at: now,
        };
        let wallet = Wallet {
            id: Uuid::new_v4(),
            user_id: user.id,
            wallet_address: new.wallet_address,
            pay_id: new.pay_id,
            balance: new.seed_balance,
            created_at: now,
        };

        inner.by_address.insert(wallet.wallet_address.clone(), wallet.id);
        inner.by_pay_id.insert(wallet.pay_id.clone(), wallet.id);
        inner.users.insert(user.id, user.clone());
        inner.wallets.insert(wallet.id, wallet.clone());

        Ok((user, wallet))
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>, StoreError> {
        Ok(self
            .lock()
            .wallets
            .values()
            .find(|w| w.user_id == user_id)
            .cloned())
    }

    async fn wallet_by_address(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<Wallet>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .by_address
            .get(address)
            .and_then(|id| inner.wallets.get(id))
            .cloned())
    }

    async fn wallet_by_pay_id(&self, pay_id: &PayId) -> Result<Option<Wallet>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .by_pay_id
            .get(pay_id)
            .and_then(|id| inner.wallets.get(id))
            .cloned())
    }

    async fn pay_id_in_use(&self, pay_id: &PayId) -> Result<bool, StoreError> {
        Ok(self.lock().by_pay_id.contains_key(pay_id))
    }

    async fn apply_transfer(
        &self,
        from: &WalletAddress,
        to: &WalletAddress,
        amount: Amount,
    ) -> Result<TransferBalances, StoreError> {
        let mut inner = self.lock();

        let from_id = *inner.by_address.get(from).ok_or(StoreError::NotFound)?;
        let to_id = *inner.by_address.get(to).ok_or(StoreError::NotFound)?;

        let sender_balance = inner
            .wallets
            .get(&from_id)
            .ok_or(StoreError::NotFound)?
            .balance;
        let new_sender = sender_balance
            .checked_sub(amount)
            .map_err(|_| StoreError::InsufficientBalance)?;
        let receiver_balance = inner
            .wallets
            .get(&to_id)
            .ok_or(StoreError::NotFound)?
            .balance;
        let new_receiver = receiver_balance
            .checked_add(amount)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // Both writes under the same lock as the checks above.
        inner
            .wallets
            .get_mut(&from_id)
            .ok_or(StoreError::NotFound)?
            .balance = new_sender;
        inner
            .wallets
            .get_mut(&to_id)
            .ok_or(StoreError::NotFound)?
            .balance = new_receiver;

        Ok(TransferBalances {
            sender: new_sender,
            receiver: new_receiver,
        })
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn append(&self, tx: Transaction) -> Result<(), StoreError> {
        self.lock().transactions.push(tx);
        Ok(())
    }

    async fn for_wallet(&self, address: &WalletAddress) -> Result<Vec<Transaction>, StoreError> {
        let mut txs: Vec<Transaction> = self
            .lock()
            .transactions
            .iter()
            .filter(|tx| tx.involves(address))
            .cloned()
            .collect();
        txs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(txs)
    }
}
