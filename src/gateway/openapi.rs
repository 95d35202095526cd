//! OpenAPI / Swagger UI documentation
//!
//! - Swagger UI: `http://localhost:5000/docs`
//! - OpenAPI JSON: `http://localhost:5000/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::types::{
    CreateTransactionRequest, HealthResponse, LoginRequest, QrResponse, RecipientPreview,
    RegisterRequest, TokenResponse, TransferResponseData, UserProfile,
};
use crate::model::{Transaction, TxStatus, Wallet};

/// Bearer-JWT security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token from POST /api/users or POST /api/auth",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Main API documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PAY Wallet API",
        version = "1.0.0",
        description = "Demo digital-wallet API: register, get a seeded balance, transfer funds by wallet address or PAY ID.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::root_check,
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::register,
        crate::gateway::handlers::login,
        crate::gateway::handlers::current_user,
        crate::gateway::handlers::get_wallet,
        crate::gateway::handlers::generate_qr,
        crate::gateway::handlers::wallet_by_address,
        crate::gateway::handlers::find_by_pay_id,
        crate::gateway::handlers::list_transactions,
        crate::gateway::handlers::create_transaction,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            UserProfile,
            RecipientPreview,
            CreateTransactionRequest,
            TransferResponseData,
            QrResponse,
            HealthResponse,
            Wallet,
            Transaction,
            TxStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "System", description = "Health checks"),
        (name = "Auth", description = "Registration, login, session identity"),
        (name = "Wallet", description = "Wallet queries and QR sharing (auth required)"),
        (name = "Users", description = "Recipient lookup (auth required)"),
        (name = "Transactions", description = "Transfer execution and history (auth required)")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "PAY Wallet API");
    }

    #[test]
    fn test_endpoints_registered() {
        let spec = ApiDoc::openapi();
        let paths = spec.paths;
        assert!(paths.paths.contains_key("/api/health"));
        assert!(paths.paths.contains_key("/api/users"));
        assert!(paths.paths.contains_key("/api/transactions"));
        assert!(paths.paths.contains_key("/api/wallets/address/{address}"));
    }

    #[test]
    fn test_security_scheme_registered() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("should have components");
        assert!(components.security_schemes.contains_key("bearer_jwt"));
    }
}
