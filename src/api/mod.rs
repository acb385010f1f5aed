//! HTTP API: shared state and route table.

pub mod admin;
pub mod auth;
pub mod orders;
pub mod shop;
pub mod support;
pub mod wallet;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::health::HealthChecker;
use crate::services::{
    AdminService, AuthService, PurchaseService, ShopService, SupportService, WalletService,
};

/// Shared handler state. Services are behind Arcs so the router clones
/// stay cheap.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub purchases: Arc<PurchaseService>,
    pub wallet: Arc<WalletService>,
    pub shops: Arc<ShopService>,
    pub admin: Arc<AdminService>,
    pub support: Arc<SupportService>,
    pub health: Arc<HealthChecker>,
}

/// Full route table. Middleware layers are applied by the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/signup", post(auth::signup))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/user-info", get(auth::user_info))
        .route("/api/upgrade-agent", post(auth::upgrade_agent))
        .route("/api/purchase", post(orders::purchase))
        .route("/api/purchase-direct", post(orders::purchase_direct))
        .route("/api/data-plans", get(orders::data_plans))
        .route("/api/my-orders", get(orders::my_orders))
        .route("/api/wallet/fund", post(wallet::fund))
        .route("/api/withdraw", post(wallet::withdraw))
        .route("/api/shop-details/{slug}", get(shop::shop_details))
        .route("/api/agent/setup-shop", post(shop::setup_shop))
        .route(
            "/api/support/tickets",
            get(support::my_tickets).post(support::open_ticket),
        )
        .route("/api/admin/all-orders", get(admin::all_orders))
        .route("/api/admin/users", get(admin::users))
        .route("/api/admin/withdrawals", get(admin::withdrawals))
        .route("/api/admin/credit-wallet", post(admin::credit_wallet))
        .route("/api/admin/update-order", post(admin::update_order))
        .route(
            "/api/admin/approve-withdrawal",
            post(admin::approve_withdrawal),
        )
        .route("/api/admin/metrics", get(admin::metrics))
        .route("/api/admin/support/tickets", get(admin::support_tickets))
        .route(
            "/api/admin/support/close-ticket",
            post(admin::close_ticket),
        )
        .with_state(state)
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<crate::health::HealthStatus>, (axum::http::StatusCode, String)> {
    let status = state.health.check_health().await;
    if matches!(status.status, crate::health::HealthState::Unhealthy) {
        return Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable".to_string(),
        ));
    }
    Ok(axum::Json(status))
}
