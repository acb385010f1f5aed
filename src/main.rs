use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{error, info};

use Datawave_backend::api::{self, AppState};
use Datawave_backend::config::AppConfig;
use Datawave_backend::database::{
    init_pool_from_config,
    order_repository::OrderRepository,
    session_repository::SessionRepository,
    shop_repository::ShopRepository,
    support_ticket_repository::SupportTicketRepository,
    user_repository::UserRepository,
    withdrawal_repository::WithdrawalRepository,
};
use Datawave_backend::delivery::DatapacksClient;
use Datawave_backend::health::HealthChecker;
use Datawave_backend::logging::init_tracing;
use Datawave_backend::middleware::{request_logging_middleware, UuidRequestId};
use Datawave_backend::payments::PaystackVerifier;
use Datawave_backend::services::{
    AdminService, AuthService, PurchaseService, ShopService, SupportService, WalletService,
};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;

    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "Starting Datawave backend service"
    );

    info!("Initializing database connection pool...");
    let db_pool = init_pool_from_config(&config.database).await.map_err(|e| {
        error!("Failed to initialize database pool: {}", e);
        anyhow::anyhow!("database init failed: {e}")
    })?;

    // External collaborators. Both fail fast on missing credentials:
    // the service cannot take money without them.
    let verifier = Arc::new(
        PaystackVerifier::from_env()
            .map_err(|e| anyhow::anyhow!("paystack init failed: {e}"))?,
    );
    let delivery = Arc::new(
        DatapacksClient::from_env()
            .map_err(|e| anyhow::anyhow!("datapacks init failed: {e}"))?,
    );
    info!("Payment verifier and delivery provider initialized");

    let users = Arc::new(UserRepository::new(db_pool.clone()));
    let orders = Arc::new(OrderRepository::new(db_pool.clone()));
    let shops = Arc::new(ShopRepository::new(db_pool.clone()));
    let withdrawals = Arc::new(WithdrawalRepository::new(db_pool.clone()));
    let sessions = Arc::new(SessionRepository::new(db_pool.clone()));
    let tickets = Arc::new(SupportTicketRepository::new(db_pool.clone()));

    let state = AppState {
        auth: Arc::new(AuthService::new(
            users.clone(),
            sessions,
            verifier.clone(),
            config.business.clone(),
        )),
        purchases: Arc::new(PurchaseService::new(
            users.clone(),
            orders.clone(),
            shops.clone(),
            delivery,
            verifier.clone(),
        )),
        wallet: Arc::new(WalletService::new(
            users.clone(),
            orders.clone(),
            withdrawals.clone(),
            verifier,
            config.business.clone(),
        )),
        shops: Arc::new(ShopService::new(users.clone(), shops)),
        admin: Arc::new(AdminService::new(users, orders, withdrawals)),
        support: Arc::new(SupportService::new(tickets)),
        health: Arc::new(HealthChecker::new(db_pool.clone(), true, true)),
    };

    let app: Router = api::router(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(axum::middleware::from_fn(request_logging_middleware))
            .layer(PropagateRequestIdLayer::x_request_id()),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
