//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::email::{EmailProvider, SmtpEmailProvider};
use crate::jwt::JwtManager;
use crate::migration;
use crate::repository::{
    CustomerRepositoryImpl, InvoiceRepositoryImpl, OrderRepositoryImpl, TldRepositoryImpl,
};
use crate::service::{InvoiceService, OrderService, PricingService};
use crate::state::AppState;
use crate::storage::LocalFileStorage;
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch},
    Router,
};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Multipart body cap: a handful of 5 MiB documents plus form fields
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub async fn run(config: Config) -> Result<()> {
    migration::run_migrations(&config).await?;

    let pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    info!("Connected to database");

    let state = build_state(config, pool);

    let http_addr = state.config.http_addr();
    let app = build_router(state);

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server listening on {}", http_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wire repositories, services and shared state
pub fn build_state(config: Config, pool: sqlx::MySqlPool) -> AppState {
    let tld_repo = Arc::new(TldRepositoryImpl::new(pool.clone()));
    let order_repo = Arc::new(OrderRepositoryImpl::new(pool.clone()));
    let invoice_repo = Arc::new(InvoiceRepositoryImpl::new(pool.clone()));
    let customer_repo = Arc::new(CustomerRepositoryImpl::new(pool.clone()));

    let jwt_manager = Arc::new(JwtManager::new(config.jwt.clone()));

    let email_provider: Option<Arc<dyn EmailProvider>> = match &config.smtp {
        Some(smtp) => match SmtpEmailProvider::from_config(smtp) {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e) => {
                warn!(error = %e, "Invalid SMTP configuration, invoice emails disabled");
                None
            }
        },
        None => {
            info!("SMTP not configured, invoice emails disabled");
            None
        }
    };

    let storage = Arc::new(LocalFileStorage::new(config.storage.root.clone()));

    let pricing_service = Arc::new(PricingService::new(tld_repo));
    let invoice_service = Arc::new(InvoiceService::new(
        invoice_repo.clone(),
        order_repo.clone(),
        customer_repo.clone(),
        email_provider,
        config.app_base_url.clone(),
    ));
    let order_service = Arc::new(OrderService::new(
        order_repo,
        pricing_service.clone(),
        customer_repo,
        invoice_repo,
        invoice_service.clone(),
        storage,
    ));

    AppState {
        config: Arc::new(config),
        pool,
        jwt_manager,
        pricing_service,
        order_service,
        invoice_service,
    }
}

pub fn build_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready))
        // TLD catalog
        .route("/api/v1/tlds", get(api::tld::list).post(api::tld::create))
        .route(
            "/api/v1/tlds/{id}",
            get(api::tld::get)
                .put(api::tld::update)
                .delete(api::tld::delete),
        )
        // Orders
        .route(
            "/api/v1/orders",
            get(api::order::list).post(api::order::create),
        )
        .route(
            "/api/v1/orders/{id}",
            get(api::order::get).delete(api::order::delete),
        )
        .route(
            "/api/v1/orders/{id}/documents/{document_id}/download",
            get(api::order::download_document),
        )
        // Invoices
        .route("/api/v1/invoices", get(api::invoice::list))
        .route("/api/v1/my-invoices", get(api::invoice::list_own))
        .route("/api/v1/invoices/{id}", get(api::invoice::get))
        .route(
            "/api/v1/invoices/{id}/mark-paid",
            patch(api::invoice::mark_paid),
        )
        .route("/api/v1/invoices/{id}/cancel", patch(api::invoice::cancel))
        .route(
            "/api/v1/invoices/{id}/download",
            get(api::invoice::download),
        )
        // Add middleware
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
