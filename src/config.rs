use serde::{Deserialize, Serialize};
use std::fs;

use crate::money::Amount;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Starting credit granted to every new wallet.
    #[serde(default = "default_seed_balance")]
    pub seed_balance: Amount,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty list means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    #[serde(default)]
    pub postgres_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            postgres_url: None,
        }
    }
}

fn default_seed_balance() -> Amount {
    Amount::from_cents(10_000)
}

fn default_token_ttl_hours() -> i64 {
    120
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let yaml = r#"
log_level: "info"
log_dir: "logs"
log_file: "paycore.log"
use_json: false
rotation: "daily"
server:
  host: "127.0.0.1"
  port: 5000
auth:
  jwt_secret: "secret"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.seed_balance, Amount::from_cents(10_000));
        assert_eq!(config.auth.token_ttl_hours, 120);
        assert!(config.server.cors_origins.is_empty());
    }

    #[test]
    fn test_postgres_backend_config() {
        let yaml = r#"
log_level: "info"
log_dir: "logs"
log_file: "paycore.log"
use_json: true
rotation: "hourly"
server:
  host: "0.0.0.0"
  port: 8080
  cors_origins:
    - "http://localhost:3000"
auth:
  jwt_secret: "secret"
  token_ttl_hours: 24
store:
  backend: "postgres"
  postgres_url: "postgresql://u:p@localhost/db"
seed_balance: "250.00"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.seed_balance, Amount::from_cents(25_000));
        assert_eq!(config.server.cors_origins.len(), 1);
    }
}
