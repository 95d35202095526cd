//! Transfer Engine
//!
//! Validates and executes a single funds transfer between two wallets as one
//! logical unit of work: debit the sender, credit the recipient, append one
//! immutable ledger entry, or reject with a typed error and touch nothing.
//!
//! The validation order is part of the contract: a caller always sees the
//! first failing check in the sequence amount -> sender wallet -> balance ->
//! recipient -> self-send, so error reporting is deterministic regardless of
//! store backend. The engine performs no logging and no retries; both belong
//! to the caller.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{PayId, Transaction, Wallet, WalletAddress};
use crate::money::Amount;
use crate::store::{AccountStore, LedgerStore, StoreError};

/// How the caller names the recipient: exactly one of the two selectors.
#[derive(Debug, Clone)]
pub enum RecipientSelector {
    Address(WalletAddress),
    PayId(PayId),
}

/// A transfer request after boundary decoding, before validation.
#[derive(Debug, Clone)]
pub struct TransferSpec {
    /// Raw amount as decoded from the request; `None` when absent.
    pub amount: Option<Decimal>,
    pub recipient: RecipientSelector,
}

/// Everything a successful transfer produces.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub transaction: Transaction,
    pub sender_balance: Amount,
    pub receiver_balance: Amount,
}

/// Typed transfer rejections, ordered by the validation sequence.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("amount must be a positive number with at most 2 decimals")]
    InvalidAmount,

    #[error("no wallet found for this user")]
    SenderWalletNotFound,

    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: Amount, required: Amount },

    #[error("recipient not found")]
    RecipientNotFound,

    #[error("cannot send funds to yourself")]
    SelfTransfer,

    #[error("storage failure: {0}")]
    Storage(StoreError),
}

/// Executes funds transfers against the injected stores.
pub struct TransferEngine {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn LedgerStore>,
}

impl TransferEngine {
    pub fn new(accounts: Arc<dyn AccountStore>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self { accounts, ledger }
    }

    /// Execute one transfer on behalf of `sender_user_id`.
    pub async fn transfer(
        &self,
        sender_user_id: Uuid,
        spec: TransferSpec,
    ) -> Result<TransferOutcome, TransferError> {
        // 1. Amount: present, positive, at most 2 decimals.
        let amount = spec
            .amount
            .ok_or(TransferError::InvalidAmount)
            .and_then(|raw| {
                Amount::from_decimal(raw).map_err(|_| TransferError::InvalidAmount)
            })?;

        // 2. Sender must have a wallet.
        let sender = self
            .accounts
            .wallet_by_user(sender_user_id)
            .await
            .map_err(TransferError::Storage)?
            .ok_or(TransferError::SenderWalletNotFound)?;

        // 3. Funds check against the current read. The store re-checks at
        //    commit time; this one exists for deterministic error ordering.
        if sender.balance < amount {
            return Err(TransferError::InsufficientBalance {
                balance: sender.balance,
                required: amount,
            });
        }

        // 4. Resolve the recipient.
        let recipient = self
            .resolve_recipient(&spec.recipient)
            .await?
            .ok_or(TransferError::RecipientNotFound)?;

        // 5. No self-sends.
        if sender.wallet_address == recipient.wallet_address {
            return Err(TransferError::SelfTransfer);
        }

        // Atomic debit+credit. A lost race on the balance comes back as
        // InsufficientBalance with a fresh reading.
        let balances = match self
            .accounts
            .apply_transfer(&sender.wallet_address, &recipient.wallet_address, amount)
            .await
        {
            Ok(balances) => balances,
            Err(StoreError::InsufficientBalance) => {
                let balance = self
                    .accounts
                    .wallet_by_address(&sender.wallet_address)
                    .await
                    .map_err(TransferError::Storage)?
                    .map(|w| w.balance)
                    .unwrap_or(sender.balance);
                return Err(TransferError::InsufficientBalance {
                    balance,
                    required: amount,
                });
            }
            Err(e) => return Err(TransferError::Storage(e)),
        };

        let transaction = Transaction::completed(&sender, &recipient, amount);
        self.ledger
            .append(transaction.clone())
            .await
            .map_err(TransferError::Storage)?;

        Ok(TransferOutcome {
            transaction,
            sender_balance: balances.sender,
            receiver_balance: balances.receiver,
        })
    }

    async fn resolve_recipient(
        &self,
        selector: &RecipientSelector,
    ) -> Result<Option<Wallet>, TransferError> {
        let wallet = match selector {
            RecipientSelector::Address(address) => self
                .accounts
                .wallet_by_address(address)
                .await
                .map_err(TransferError::Storage)?,
            RecipientSelector::PayId(pay_id) => self
                .accounts
                .wallet_by_pay_id(pay_id)
                .await
                .map_err(TransferError::Storage)?,
        };
        Ok(wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::NewAccount;
    use std::str::FromStr;

    struct Fixture {
        engine: TransferEngine,
        accounts: Arc<MemoryStore>,
        alice: Uuid,
        alice_wallet: Wallet,
        bob_wallet: Wallet,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let (alice, alice_wallet) = store
            .create_account(NewAccount {
                username: "alice".to_string(),
                password_hash: "$argon2$test".to_string(),
                pay_id: PayId::parse("1111").unwrap(),
                wallet_address: WalletAddress::generate(),
                seed_balance: Amount::from_cents(10_000),
            })
            .await
            .unwrap();
        let (_, bob_wallet) = store
            .create_account(NewAccount {
                username: "bob".to_string(),
                password_hash: "$argon2$test".to_string(),
                pay_id: PayId::parse("2222").unwrap(),
                wallet_address: WalletAddress::generate(),
                seed_balance: Amount::from_cents(1_000),
            })
            .await
            .unwrap();

        Fixture {
            engine: TransferEngine::new(store.clone(), store.clone()),
            accounts: store,
            alice: alice.id,
            alice_wallet,
            bob_wallet,
        }
    }

    fn spec(amount: &str, recipient: RecipientSelector) -> TransferSpec {
        TransferSpec {
            amount: Some(Decimal::from_str(amount).unwrap()),
            recipient,
        }
    }

    #[tokio::test]
    async fn test_transfer_by_address_moves_funds_and_writes_ledger() {
        let f = fixture().await;
        let outcome = f
            .engine
            .transfer(
                f.alice,
                spec(
                    "42.75",
                    RecipientSelector::Address(f.bob_wallet.wallet_address.clone()),
                ),
            )
            .await
            .unwrap();

        // 100.00 - 42.75 / 10.00 + 42.75
        assert_eq!(outcome.sender_balance.to_string(), "57.25");
        assert_eq!(outcome.receiver_balance.to_string(), "52.75");
        assert_eq!(outcome.transaction.amount.to_string(), "42.75");
        assert_eq!(
            outcome.transaction.sender_wallet_address,
            f.alice_wallet.wallet_address
        );

        let ledger = f
            .accounts
            .for_wallet(&f.alice_wallet.wallet_address)
            .await
            .unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].id, outcome.transaction.id);
    }

    #[tokio::test]
    async fn test_transfer_by_pay_id_resolves_same_wallet() {
        let f = fixture().await;
        let outcome = f
            .engine
            .transfer(
                f.alice,
                spec("10", RecipientSelector::PayId(f.bob_wallet.pay_id.clone())),
            )
            .await
            .unwrap();
        assert_eq!(
            outcome.transaction.receiver_wallet_address,
            f.bob_wallet.wallet_address
        );
    }

    #[tokio::test]
    async fn test_debit_credit_symmetry() {
        let f = fixture().await;
        let before_sender = f.alice_wallet.balance;
        let before_receiver = f.bob_wallet.balance;
        let amount = Amount::from_cents(3333);

        let outcome = f
            .engine
            .transfer(
                f.alice,
                spec(
                    "33.33",
                    RecipientSelector::Address(f.bob_wallet.wallet_address.clone()),
                ),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome.sender_balance.checked_add(amount).unwrap(),
            before_sender
        );
        assert_eq!(
            outcome.receiver_balance.checked_sub(amount).unwrap(),
            before_receiver
        );
    }

    #[tokio::test]
    async fn test_missing_amount_is_invalid() {
        let f = fixture().await;
        let err = f
            .engine
            .transfer(
                f.alice,
                TransferSpec {
                    amount: None,
                    recipient: RecipientSelector::Address(f.bob_wallet.wallet_address.clone()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidAmount));
    }

    #[tokio::test]
    async fn test_non_positive_and_overprecise_amounts_are_invalid() {
        let f = fixture().await;
        for bad in ["0", "-1", "0.001", "1.005"] {
            let err = f
                .engine
                .transfer(
                    f.alice,
                    spec(
                        bad,
                        RecipientSelector::Address(f.bob_wallet.wallet_address.clone()),
                    ),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, TransferError::InvalidAmount), "amount {bad}");
        }
    }

    #[tokio::test]
    async fn test_unknown_sender_has_no_wallet() {
        let f = fixture().await;
        let err = f
            .engine
            .transfer(
                Uuid::new_v4(),
                spec(
                    "1",
                    RecipientSelector::Address(f.bob_wallet.wallet_address.clone()),
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::SenderWalletNotFound));
    }

    #[tokio::test]
    async fn test_insufficient_balance_reports_both_figures_and_mutates_nothing() {
        let f = fixture().await;
        let err = f
            .engine
            .transfer(
                f.alice,
                spec(
                    "100.01",
                    RecipientSelector::Address(f.bob_wallet.wallet_address.clone()),
                ),
            )
            .await
            .unwrap_err();

        match err {
            TransferError::InsufficientBalance { balance, required } => {
                assert_eq!(balance.to_string(), "100.00");
                assert_eq!(required.to_string(), "100.01");
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }

        let sender = f
            .accounts
            .wallet_by_address(&f.alice_wallet.wallet_address)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sender.balance.cents(), 10_000);
        let ledger = f
            .accounts
            .for_wallet(&f.alice_wallet.wallet_address)
            .await
            .unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_balance_beats_bad_recipient() {
        // Balance is checked before recipient resolution; a broke sender with
        // a bogus recipient still sees the balance error.
        let f = fixture().await;
        let err = f
            .engine
            .transfer(
                f.alice,
                spec(
                    "5000",
                    RecipientSelector::PayId(PayId::parse("0000").unwrap()),
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::InsufficientBalance { .. }));
    }

    #[tokio::test]
    async fn test_unassigned_pay_id_is_recipient_not_found() {
        let f = fixture().await;
        let err = f
            .engine
            .transfer(
                f.alice,
                spec("1", RecipientSelector::PayId(PayId::parse("0000").unwrap())),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::RecipientNotFound));
    }

    #[tokio::test]
    async fn test_self_transfer_rejected_by_address_and_pay_id() {
        let f = fixture().await;

        let err = f
            .engine
            .transfer(
                f.alice,
                spec(
                    "1",
                    RecipientSelector::Address(f.alice_wallet.wallet_address.clone()),
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::SelfTransfer));

        let err = f
            .engine
            .transfer(
                f.alice,
                spec("1", RecipientSelector::PayId(f.alice_wallet.pay_id.clone())),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::SelfTransfer));

        let sender = f
            .accounts
            .wallet_by_address(&f.alice_wallet.wallet_address)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sender.balance.cents(), 10_000);
    }

    #[tokio::test]
    async fn test_value_is_conserved_across_sequences() {
        let f = fixture().await;
        let total_before = 10_000 + 1_000;

        for (amount, to_bob) in [("12.34", true), ("0.66", true), ("5.00", false)] {
            let (sender, recipient) = if to_bob {
                (f.alice, f.bob_wallet.wallet_address.clone())
            } else {
                (f.bob_wallet.user_id, f.alice_wallet.wallet_address.clone())
            };
            f.engine
                .transfer(sender, spec(amount, RecipientSelector::Address(recipient)))
                .await
                .unwrap();
        }

        let a = f
            .accounts
            .wallet_by_address(&f.alice_wallet.wallet_address)
            .await
            .unwrap()
            .unwrap();
        let b = f
            .accounts
            .wallet_by_address(&f.bob_wallet.wallet_address)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(a.balance.cents() + b.balance.cents(), total_before);
    }

    #[tokio::test]
    async fn test_two_identical_requests_are_two_transfers() {
        // The engine is deliberately not idempotent; dedup is an API-layer
        // concern.
        let f = fixture().await;
        for _ in 0..2 {
            f.engine
                .transfer(
                    f.alice,
                    spec(
                        "10",
                        RecipientSelector::Address(f.bob_wallet.wallet_address.clone()),
                    ),
                )
                .await
                .unwrap();
        }

        let ledger = f
            .accounts
            .for_wallet(&f.alice_wallet.wallet_address)
            .await
            .unwrap();
        assert_eq!(ledger.len(), 2);
        let sender = f
            .accounts
            .wallet_by_address(&f.alice_wallet.wallet_address)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sender.balance.to_string(), "80.00");
    }
}
