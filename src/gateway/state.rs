//! Shared gateway application state

use std::sync::Arc;
use std::time::Instant;

use crate::auth::AuthService;
use crate::engine::TransferEngine;
use crate::store::{AccountStore, LedgerStore};

/// State shared by all handlers.
pub struct AppState {
    pub engine: TransferEngine,
    pub accounts: Arc<dyn AccountStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub auth: Arc<AuthService>,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        engine: TransferEngine,
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn LedgerStore>,
        auth: Arc<AuthService>,
    ) -> Self {
        Self {
            engine,
            accounts,
            ledger,
            auth,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the gateway came up, for the health endpoint.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
