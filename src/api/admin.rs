//! Admin endpoints. Every handler requires the Admin role via the
//! `AdminUser` extractor.

use axum::extract::State;
use axum::Json;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::api::auth::UserView;
use crate::api::AppState;
use crate::database::order_repository::{Order, OrderWithUser};
use crate::database::support_ticket_repository::{SupportTicket, TicketWithUser};
use crate::database::withdrawal_repository::{Withdrawal, WithdrawalWithUser};
use crate::error::{AppError, AppResult, ValidationError};
use crate::middleware::auth::AdminUser;

#[derive(Debug, Deserialize)]
pub struct CreditWalletBody {
    pub user_id: Uuid,
    /// Decimal GHS
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderBody {
    pub order_id: Uuid,
    pub status: String,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApproveWithdrawalBody {
    pub withdrawal_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CloseTicketBody {
    pub ticket_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub total_users: i64,
    pub total_orders: i64,
    pub total_revenue: BigDecimal,
    pub net_profit: BigDecimal,
}

pub async fn all_orders(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> AppResult<Json<Vec<OrderWithUser>>> {
    Ok(Json(state.admin.recent_orders().await?))
}

pub async fn users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> AppResult<Json<Vec<UserView>>> {
    let users = state.admin.list_users().await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

pub async fn withdrawals(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> AppResult<Json<Vec<WithdrawalWithUser>>> {
    Ok(Json(state.admin.list_withdrawals().await?))
}

pub async fn credit_wallet(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(body): Json<CreditWalletBody>,
) -> AppResult<Json<Order>> {
    let amount = BigDecimal::from_str(body.amount.trim()).map_err(|_| {
        AppError::validation(ValidationError::InvalidAmount {
            amount: body.amount.clone(),
            reason: "not a decimal number".to_string(),
        })
    })?;

    Ok(Json(state.admin.credit_wallet(body.user_id, amount).await?))
}

pub async fn update_order(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(body): Json<UpdateOrderBody>,
) -> AppResult<Json<Order>> {
    Ok(Json(
        state
            .admin
            .set_order_status(body.order_id, &body.status, body.force)
            .await?,
    ))
}

pub async fn approve_withdrawal(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(body): Json<ApproveWithdrawalBody>,
) -> AppResult<Json<Withdrawal>> {
    Ok(Json(
        state.admin.approve_withdrawal(body.withdrawal_id).await?,
    ))
}

pub async fn metrics(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> AppResult<Json<MetricsResponse>> {
    let metrics = state.admin.metrics().await?;
    Ok(Json(MetricsResponse {
        total_users: metrics.total_users,
        total_orders: metrics.total_orders,
        total_revenue: metrics.total_revenue,
        net_profit: metrics.net_profit,
    }))
}

pub async fn support_tickets(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> AppResult<Json<Vec<TicketWithUser>>> {
    Ok(Json(state.support.all_tickets().await?))
}

pub async fn close_ticket(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(body): Json<CloseTicketBody>,
) -> AppResult<Json<SupportTicket>> {
    Ok(Json(state.support.close_ticket(body.ticket_id).await?))
}
