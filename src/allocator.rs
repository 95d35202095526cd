//! ID Allocator
//!
//! Produces the two identifiers minted at registration: the opaque wallet
//! address and the human-shareable 4-digit PAY ID. Wallet addresses are
//! high-entropy (UUID v4) and collisions are treated as negligible; the
//! store's unique constraint is the safety net. PAY IDs live in a space of
//! only 9000 values, so allocation draws uniformly and redraws on collision,
//! giving up with [`AllocatorError::IdSpaceExhausted`] after a bounded number
//! of attempts.
//!
//! The allocator itself is advisory: under concurrent registration the
//! store's uniqueness constraint is authoritative, and registration retries
//! allocation when a draw loses that race.

use rand::Rng;
use thiserror::Error;

use crate::model::{PayId, WalletAddress};
use crate::store::{AccountStore, StoreError};

/// Default PAY ID range, inclusive.
const DEFAULT_RANGE: (u16, u16) = (1000, 9999);

/// Default bound on redraw attempts before reporting exhaustion.
const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

#[derive(Debug, Error)]
pub enum AllocatorError {
    #[error("no free PAY ID after {attempts} attempts")]
    IdSpaceExhausted { attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Allocates identifiers unique within the active account population.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    lo: u16,
    hi: u16,
    max_attempts: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            lo: DEFAULT_RANGE.0,
            hi: DEFAULT_RANGE.1,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the draw range, used by tests to make exhaustion reachable.
    #[cfg(test)]
    pub(crate) fn with_range(lo: u16, hi: u16, max_attempts: u32) -> Self {
        Self { lo, hi, max_attempts }
    }

    /// A fresh opaque wallet address.
    pub fn wallet_address(&self) -> WalletAddress {
        WalletAddress::generate()
    }

    /// Draw a PAY ID not currently assigned to any account.
    pub async fn pay_id(&self, accounts: &dyn AccountStore) -> Result<PayId, AllocatorError> {
        for _ in 0..self.max_attempts {
            let draw = rand::thread_rng().gen_range(self.lo..=self.hi);
            let candidate = PayId::from_number(draw);
            if !accounts.pay_id_in_use(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(AllocatorError::IdSpaceExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Amount;
    use crate::store::NewAccount;
    use crate::store::memory::MemoryStore;

    async fn occupy(store: &MemoryStore, pay_id: PayId) {
        store
            .create_account(NewAccount {
                username: format!("user-{}", pay_id.as_str()),
                password_hash: "$argon2$test".to_string(),
                pay_id,
                wallet_address: WalletAddress::generate(),
                seed_balance: Amount::from_cents(10_000),
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_wallet_addresses_are_distinct() {
        let allocator = IdAllocator::new();
        assert_ne!(allocator.wallet_address(), allocator.wallet_address());
    }

    #[tokio::test]
    async fn test_pay_id_in_range_and_four_digits() {
        let store = MemoryStore::new();
        let allocator = IdAllocator::new();

        for _ in 0..50 {
            let id = allocator.pay_id(&store).await.unwrap();
            assert_eq!(id.as_str().len(), 4);
            let n: u16 = id.as_str().parse().unwrap();
            assert!((1000..=9999).contains(&n));
        }
    }

    #[tokio::test]
    async fn test_pay_id_skips_assigned_values() {
        let store = MemoryStore::new();
        // Fill all but one slot of a tiny space.
        for n in 1000..1010 {
            if n != 1007 {
                occupy(&store, PayId::from_number(n)).await;
            }
        }

        let allocator = IdAllocator::with_range(1000, 1009, 1_000);
        let id = allocator.pay_id(&store).await.unwrap();
        assert_eq!(id.as_str(), "1007");
    }

    #[tokio::test]
    async fn test_exhausted_space_reports_error() {
        let store = MemoryStore::new();
        for n in 1000..1010 {
            occupy(&store, PayId::from_number(n)).await;
        }

        let allocator = IdAllocator::with_range(1000, 1009, 500);
        let err = allocator.pay_id(&store).await.unwrap_err();
        assert!(matches!(
            err,
            AllocatorError::IdSpaceExhausted { attempts: 500 }
        ));
    }

    #[tokio::test]
    async fn test_sequential_draws_fill_small_space() {
        // Drain a 20-value space completely: every draw lands in range and is
        // distinct once occupied.
        let store = MemoryStore::new();
        let allocator = IdAllocator::with_range(1000, 1019, 100_000);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..20 {
            let id = allocator.pay_id(&store).await.unwrap();
            assert!(seen.insert(id.as_str().to_string()), "duplicate draw");
            occupy(&store, id).await;
        }
        assert_eq!(seen.len(), 20);

        let err = allocator.pay_id(&store).await.unwrap_err();
        assert!(matches!(err, AllocatorError::IdSpaceExhausted { .. }));
    }
}
