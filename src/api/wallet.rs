//! Wallet funding and withdrawal endpoints.

use axum::extract::State;
use axum::Json;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::database::order_repository::Order;
use crate::database::withdrawal_repository::Withdrawal;
use crate::error::{AppError, AppResult, ValidationError};
use crate::middleware::auth::CurrentUser;
use crate::services::WithdrawRequest;

#[derive(Debug, Deserialize)]
pub struct FundBody {
    pub reference: String,
    /// Decimal GHS, as a string to avoid float drift
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawBody {
    pub amount: String,
    pub account_number: String,
    pub account_name: String,
    pub network: String,
}

#[derive(Debug, Serialize)]
pub struct FundResponse {
    pub order: Order,
    pub new_balance: i64,
}

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    pub withdrawal: Withdrawal,
    pub new_payout_balance: i64,
}

fn parse_amount(raw: &str) -> AppResult<BigDecimal> {
    BigDecimal::from_str(raw.trim()).map_err(|_| {
        AppError::validation(ValidationError::InvalidAmount {
            amount: raw.to_string(),
            reason: "not a decimal number".to_string(),
        })
    })
}

pub async fn fund(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(body): Json<FundBody>,
) -> AppResult<Json<FundResponse>> {
    let amount = parse_amount(&body.amount)?;
    let outcome = state
        .wallet
        .top_up(session.user_id, &body.reference, amount)
        .await?;

    Ok(Json(FundResponse {
        order: outcome.order,
        new_balance: outcome.new_balance,
    }))
}

pub async fn withdraw(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(body): Json<WithdrawBody>,
) -> AppResult<Json<WithdrawResponse>> {
    let amount = parse_amount(&body.amount)?;
    let outcome = state
        .wallet
        .withdraw(
            session.user_id,
            WithdrawRequest {
                amount,
                account_number: body.account_number,
                account_name: body.account_name,
                network: body.network,
            },
        )
        .await?;

    Ok(Json(WithdrawResponse {
        withdrawal: outcome.withdrawal,
        new_payout_balance: outcome.new_payout_balance,
    }))
}
