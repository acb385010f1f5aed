//! Purchase and order endpoints.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::database::order_repository::Order;
use crate::database::user_repository::Role;
use crate::error::AppResult;
use crate::middleware::auth::{CurrentUser, MaybeUser};
use crate::pricing::{price_book, PriceTier};
use crate::services::PurchaseRequest;

#[derive(Debug, Deserialize)]
pub struct PurchaseBody {
    pub network: String,
    pub plan_id: String,
    pub phone: String,
    #[serde(default)]
    pub shop_slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DirectPurchaseBody {
    pub reference: String,
    pub network: String,
    pub plan_id: String,
    pub phone: String,
    #[serde(default)]
    pub shop_slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<i64>,
}

pub async fn purchase(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(body): Json<PurchaseBody>,
) -> AppResult<Json<PurchaseResponse>> {
    let outcome = state
        .purchases
        .purchase_with_wallet(
            session.user_id,
            PurchaseRequest {
                network: body.network,
                plan_id: body.plan_id,
                phone: body.phone,
                shop_slug: body.shop_slug,
            },
        )
        .await?;

    Ok(Json(PurchaseResponse {
        order: outcome.order,
        new_balance: outcome.new_balance,
    }))
}

/// Guest checkout: the payment reference stands in for a wallet.
pub async fn purchase_direct(
    State(state): State<AppState>,
    Json(body): Json<DirectPurchaseBody>,
) -> AppResult<Json<PurchaseResponse>> {
    let outcome = state
        .purchases
        .purchase_direct(
            &body.reference,
            PurchaseRequest {
                network: body.network,
                plan_id: body.plan_id,
                phone: body.phone,
                shop_slug: body.shop_slug,
            },
        )
        .await?;

    Ok(Json(PurchaseResponse {
        order: outcome.order,
        new_balance: outcome.new_balance,
    }))
}

/// Price list, tiered by role: agents and admins see wholesale, guests
/// and clients see retail.
pub async fn data_plans(
    MaybeUser(session): MaybeUser,
) -> AppResult<Json<serde_json::Value>> {
    let tier = session
        .as_ref()
        .map(|s| Role::from_str(&s.role).unwrap_or(Role::Client))
        .filter(Role::buys_wholesale)
        .map(|_| PriceTier::Wholesale)
        .unwrap_or(PriceTier::Retail);

    Ok(Json(price_book(tier)))
}

pub async fn my_orders(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.purchases.my_orders(session.user_id).await?))
}
