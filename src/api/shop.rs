//! Storefront endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::database::shop_repository::Shop;
use crate::database::user_repository::Role;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct SetupShopBody {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub custom_prices: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ShopDetailsResponse {
    pub slug: String,
    pub name: String,
    pub custom_prices: serde_json::Value,
    pub base_prices: serde_json::Value,
}

/// Public storefront lookup; no session required.
pub async fn shop_details(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ShopDetailsResponse>> {
    let details = state.shops.shop_details(&slug).await?;
    Ok(Json(ShopDetailsResponse {
        slug: details.slug,
        name: details.name,
        custom_prices: details.custom_prices,
        base_prices: details.base_prices,
    }))
}

pub async fn setup_shop(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(body): Json<SetupShopBody>,
) -> AppResult<Json<Shop>> {
    let role = Role::from_str(&session.role).unwrap_or(Role::Client);
    let custom_prices = if body.custom_prices.is_null() {
        serde_json::json!({})
    } else {
        body.custom_prices
    };

    let shop = state
        .shops
        .setup_shop(session.user_id, role, &body.slug, &body.name, custom_prices)
        .await?;
    Ok(Json(shop))
}
