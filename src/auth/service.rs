//! Auth service
//!
//! Registration creates the User and its seeded Wallet in one unit of work:
//! validate the credentials, hash the password (argon2), allocate a wallet
//! address and a free PAY ID, and hand everything to the account store. A
//! PAY-ID draw that loses a concurrent-registration race is retried with a
//! fresh allocation; the store's uniqueness constraint is authoritative.
//!
//! Sessions are stateless JWTs (HS256) carrying the user id as `sub`.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::allocator::{AllocatorError, IdAllocator};
use crate::model::{User, Wallet};
use crate::money::Amount;
use crate::store::{AccountStore, NewAccount, StoreError};

/// Registration retries after losing a PAY-ID race to a concurrent signup.
const PAY_ID_CONFLICT_RETRIES: u32 = 5;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

/// JWT claims carried by every session token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Expiration time (UTC timestamp)
    pub exp: usize,
    /// Issued at
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username must be at least {MIN_USERNAME_LEN} characters long")]
    UsernameTooShort,

    #[error("password must be at least {MIN_PASSWORD_LEN} characters long")]
    PasswordTooShort,

    #[error("user already exists")]
    UserExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no free PAY ID available")]
    IdSpaceExhausted,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl From<AllocatorError> for AuthError {
    fn from(e: AllocatorError) -> Self {
        match e {
            AllocatorError::IdSpaceExhausted { .. } => AuthError::IdSpaceExhausted,
            AllocatorError::Store(e) => AuthError::Storage(e),
        }
    }
}

/// A freshly registered account with its session token.
#[derive(Debug)]
pub struct RegisteredAccount {
    pub user: User,
    pub wallet: Wallet,
    pub token: String,
}

pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    allocator: IdAllocator,
    jwt_secret: String,
    token_ttl: Duration,
    seed_balance: Amount,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        allocator: IdAllocator,
        jwt_secret: String,
        token_ttl: Duration,
        seed_balance: Amount,
    ) -> Self {
        Self {
            accounts,
            allocator,
            jwt_secret,
            token_ttl,
            seed_balance,
        }
    }

    /// Register a new user and seed their wallet.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisteredAccount, AuthError> {
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(AuthError::UsernameTooShort);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }
        if self
            .accounts
            .user_by_username(username)
            .await
            .map_err(AuthError::Storage)?
            .is_some()
        {
            return Err(AuthError::UserExists);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .to_string();

        let mut attempt = 0;
        let (user, wallet) = loop {
            let pay_id = self.allocator.pay_id(self.accounts.as_ref()).await?;
            let new = NewAccount {
                username: username.to_string(),
                password_hash: password_hash.clone(),
                pay_id,
                wallet_address: self.allocator.wallet_address(),
                seed_balance: self.seed_balance,
            };
            match self.accounts.create_account(new).await {
                Ok(created) => break created,
                // Lost the PAY-ID race to a concurrent registration: redraw.
                Err(StoreError::PayIdTaken) if attempt < PAY_ID_CONFLICT_RETRIES => {
                    attempt += 1;
                    continue;
                }
                Err(StoreError::PayIdTaken) => return Err(AuthError::IdSpaceExhausted),
                Err(StoreError::UsernameTaken) => return Err(AuthError::UserExists),
                Err(e) => return Err(AuthError::Storage(e)),
            }
        };

        let token = self.issue_token(user.id)?;
        Ok(RegisteredAccount {
            user,
            wallet,
            token,
        })
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown username and wrong password are indistinguishable to the
    /// caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), AuthError> {
        let user = self
            .accounts
            .user_by_username(username)
            .await
            .map_err(AuthError::Storage)?
            .ok_or(AuthError::InvalidCredentials)?;

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let token = self.issue_token(user.id)?;
        Ok((user, token))
    }

    /// Verify a JWT and return its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    fn issue_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.token_ttl)
            .unwrap_or(now)
            .timestamp();

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryStore::new()),
            IdAllocator::new(),
            "test-secret".to_string(),
            Duration::hours(1),
            Amount::from_cents(10_000),
        )
    }

    #[tokio::test]
    async fn test_register_seeds_wallet_and_issues_token() {
        let auth = service();
        let account = auth.register("alice", "hunter2!").await.unwrap();

        assert_eq!(account.user.username, "alice");
        assert_eq!(account.wallet.balance.to_string(), "100.00");
        assert_eq!(account.wallet.pay_id, account.user.pay_id);
        assert_eq!(account.wallet.user_id, account.user.id);

        let claims = auth.verify_token(&account.token).unwrap();
        assert_eq!(claims.user_id(), Some(account.user.id));
    }

    #[tokio::test]
    async fn test_register_validates_credentials() {
        let auth = service();
        assert!(matches!(
            auth.register("al", "hunter2!").await.unwrap_err(),
            AuthError::UsernameTooShort
        ));
        assert!(matches!(
            auth.register("alice", "pw").await.unwrap_err(),
            AuthError::PasswordTooShort
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username() {
        let auth = service();
        auth.register("alice", "hunter2!").await.unwrap();
        assert!(matches!(
            auth.register("alice", "different").await.unwrap_err(),
            AuthError::UserExists
        ));
    }

    #[tokio::test]
    async fn test_login_roundtrip_and_rejections() {
        let auth = service();
        let registered = auth.register("alice", "hunter2!").await.unwrap();

        let (user, token) = auth.login("alice", "hunter2!").await.unwrap();
        assert_eq!(user.id, registered.user.id);
        assert!(auth.verify_token(&token).is_ok());

        assert!(matches!(
            auth.login("alice", "wrong").await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            auth.login("nobody", "hunter2!").await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_rejected() {
        let auth = service();
        let other = AuthService::new(
            Arc::new(MemoryStore::new()),
            IdAllocator::new(),
            "other-secret".to_string(),
            Duration::hours(1),
            Amount::from_cents(10_000),
        );

        let account = auth.register("alice", "hunter2!").await.unwrap();
        assert!(matches!(
            other.verify_token(&account.token).unwrap_err(),
            AuthError::Token(_)
        ));
    }
}
