//! paycore server entry point
//!
//! Wires the configured store backend into the transfer engine and auth
//! service, then serves the HTTP API until SIGTERM/SIGINT.

use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;

use paycore::auth::AuthService;
use paycore::config::{AppConfig, StoreBackend};
use paycore::engine::TransferEngine;
use paycore::gateway::{self, state::AppState};
use paycore::store::memory::MemoryStore;
use paycore::store::postgres::PgStore;
use paycore::store::{AccountStore, LedgerStore};
use paycore::IdAllocator;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _log_guard = paycore::logging::init_logging(&config);

    tracing::info!("starting paycore (env: {env})");

    let (accounts, ledger): (Arc<dyn AccountStore>, Arc<dyn LedgerStore>) =
        match config.store.backend {
            StoreBackend::Memory => {
                tracing::info!("store backend: in-memory (volatile)");
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            }
            StoreBackend::Postgres => {
                let url = config
                    .store
                    .postgres_url
                    .as_deref()
                    .context("store.postgres_url required for the postgres backend")?;
                let store = PgStore::connect(url)
                    .await
                    .context("failed to connect to PostgreSQL")?;
                store
                    .init_schema()
                    .await
                    .context("failed to initialize schema")?;
                tracing::info!("store backend: postgres");
                let store = Arc::new(store);
                (store.clone(), store)
            }
        };

    let auth = Arc::new(AuthService::new(
        accounts.clone(),
        IdAllocator::new(),
        config.auth.jwt_secret.clone(),
        Duration::hours(config.auth.token_ttl_hours),
        config.seed_balance,
    ));
    let engine = TransferEngine::new(accounts.clone(), ledger.clone());
    let state = Arc::new(AppState::new(engine, accounts, ledger, auth));

    gateway::run_server(&config, state).await
}
