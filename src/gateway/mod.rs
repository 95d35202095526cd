//! HTTP gateway
//!
//! Router assembly and server lifecycle. Public routes cover health checks,
//! registration, and login; everything else sits behind the JWT middleware.

pub mod handlers;
pub mod openapi;
pub mod qr;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::middleware::jwt_auth_middleware;
use crate::config::AppConfig;
use state::AppState;

/// Build the full application router.
pub fn build_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::root_check))
        .route("/api/health", get(handlers::health_check))
        .route("/api/users", post(handlers::register))
        .route("/api/auth", post(handlers::login));

    let private_routes = Router::new()
        .route("/api/auth", get(handlers::current_user))
        .route("/api/wallets", get(handlers::get_wallet))
        .route("/api/wallets/generate-qr", get(handlers::generate_qr))
        .route(
            "/api/wallets/address/{address}",
            get(handlers::wallet_by_address),
        )
        .route("/api/users/find/{pay_id}", get(handlers::find_by_pay_id))
        .route("/api/transactions", get(handlers::list_transactions))
        .route("/api/transactions", post(handlers::create_transaction))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    public_routes
        .merge(private_routes)
        .layer(cors_layer(cors_origins))
        .with_state(state)
        .merge(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let allow_origin = if parsed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Bind and serve until SIGTERM/SIGINT.
pub async fn run_server(config: &AppConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state, &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("gateway listening on http://{addr}");
    tracing::info!("API docs at http://{addr}/docs");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => tracing::error!("failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
