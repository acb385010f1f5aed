//! Admin operations: dashboards, manual credits and order corrections.
//!
//! Every funds-affecting admin action leaves an audit order so the
//! ledger stays the single source of truth for money movement.

use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::database::order_repository::{NewOrder, Order, OrderWithUser};
use crate::database::repository::{OrderStore, UserStore, WithdrawalStore};
use crate::database::user_repository::User;
use crate::database::withdrawal_repository::Withdrawal;
use crate::error::{AppError, AppResult, DomainError, ValidationError};
use crate::pricing::ghs_to_minor;
use crate::services::order_status::{check_transition, OrderStatus};

/// The admin dashboard shows recent activity, not the full ledger.
const RECENT_ORDERS_LIMIT: i64 = 50;

/// Placeholder fields for manual credit audit orders.
const ADMIN_CREDIT_PHONE: &str = "N/A";
const ADMIN_CREDIT_PLAN: &str = "Admin Credit";
const ADMIN_CREDIT_NETWORK: &str = "WALLET";
pub const PAYMENT_METHOD_ADMIN: &str = "admin";

/// Operator-facing platform totals
#[derive(Debug, Clone)]
pub struct Metrics {
    pub total_users: i64,
    pub total_orders: i64,
    /// Sum of delivered order amounts, decimal GHS
    pub total_revenue: BigDecimal,
    /// Estimated margin at the platform's blended rate
    pub net_profit: BigDecimal,
}

pub struct AdminService {
    users: Arc<dyn UserStore>,
    orders: Arc<dyn OrderStore>,
    withdrawals: Arc<dyn WithdrawalStore>,
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserStore>,
        orders: Arc<dyn OrderStore>,
        withdrawals: Arc<dyn WithdrawalStore>,
    ) -> Self {
        Self {
            users,
            orders,
            withdrawals,
        }
    }

    pub async fn recent_orders(&self) -> AppResult<Vec<OrderWithUser>> {
        Ok(self.orders.list_recent_with_user(RECENT_ORDERS_LIMIT).await?)
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.users.list_all().await?)
    }

    pub async fn list_withdrawals(
        &self,
    ) -> AppResult<Vec<crate::database::withdrawal_repository::WithdrawalWithUser>> {
        Ok(self.withdrawals.list_all_with_user().await?)
    }

    /// Manually credit a user's main wallet, leaving an audit order.
    pub async fn credit_wallet(&self, user_id: Uuid, amount: BigDecimal) -> AppResult<Order> {
        if amount <= BigDecimal::from(0) {
            return Err(AppError::validation(ValidationError::InvalidAmount {
                amount: amount.to_string(),
                reason: "credit amount must be positive".to_string(),
            }));
        }

        let amount_minor = ghs_to_minor(&amount);
        let new_balance = self
            .users
            .credit_wallet(user_id, amount_minor)
            .await?
            .ok_or_else(|| AppError::domain(DomainError::UserNotFound {
                user_id: user_id.to_string(),
            }))?;

        let reference = format!("ADMIN-{}", chrono::Utc::now().timestamp_millis());
        let order = self
            .orders
            .create(&NewOrder {
                user_id: Some(user_id),
                reference,
                phone_number: ADMIN_CREDIT_PHONE.to_string(),
                network: ADMIN_CREDIT_NETWORK.to_string(),
                plan_name: ADMIN_CREDIT_PLAN.to_string(),
                amount,
                profit: BigDecimal::from(0),
                status: OrderStatus::TopupSuccessful.as_str().to_string(),
                payment_method: PAYMENT_METHOD_ADMIN.to_string(),
                shop_slug: None,
            })
            .await?;

        info!(
            user_id = %user_id,
            order_id = %order.id,
            amount_minor = amount_minor,
            new_balance = new_balance,
            "manual wallet credit"
        );

        Ok(order)
    }

    /// Correct an order's status. Unforced changes must follow the
    /// state machine; force overrides it for manual cleanup.
    pub async fn set_order_status(
        &self,
        order_id: Uuid,
        new_status: &str,
        force: bool,
    ) -> AppResult<Order> {
        let to = OrderStatus::from_str(new_status).map_err(|_| {
            AppError::domain(DomainError::InvalidTransition {
                from: "?".to_string(),
                to: new_status.to_string(),
            })
        })?;

        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::domain(DomainError::OrderNotFound {
                order_id: order_id.to_string(),
            }))?;

        let from = OrderStatus::from_str(&order.status).unwrap_or(OrderStatus::Processing);
        check_transition(from, to, force)?;

        let updated = self
            .orders
            .update_status(order.id, to.as_str(), None)
            .await?;
        info!(
            order_id = %order.id,
            from = %from,
            to = %to,
            force = force,
            "order status corrected"
        );
        Ok(updated)
    }

    /// Mark a pending withdrawal as paid out. Approving anything not
    /// Pending fails; the money already left the payout wallet when the
    /// request was created.
    pub async fn approve_withdrawal(&self, withdrawal_id: Uuid) -> AppResult<Withdrawal> {
        match self.withdrawals.approve(withdrawal_id).await? {
            Some(withdrawal) => {
                info!(withdrawal_id = %withdrawal.id, "withdrawal approved");
                Ok(withdrawal)
            }
            None => {
                // Either missing or already handled; tell the admin which.
                match self.withdrawals.find_by_id(withdrawal_id).await? {
                    Some(existing) => Err(AppError::domain(DomainError::InvalidTransition {
                        from: existing.status,
                        to: "Paid".to_string(),
                    })),
                    None => Err(AppError::domain(DomainError::WithdrawalNotFound {
                        withdrawal_id: withdrawal_id.to_string(),
                    })),
                }
            }
        }
    }

    pub async fn metrics(&self) -> AppResult<Metrics> {
        let total_users = self.users.count().await?;
        let total_orders = self.orders.count().await?;
        let total_revenue = self.orders.sum_delivered_revenue().await?;
        let net_profit = estimate_net_profit(&total_revenue);

        Ok(Metrics {
            total_users,
            total_orders,
            total_revenue,
            net_profit,
        })
    }
}

/// Blended margin estimate: 15% of delivered revenue.
fn estimate_net_profit(revenue: &BigDecimal) -> BigDecimal {
    let rate = BigDecimal::from_str("0.15").unwrap_or_default();
    (revenue * rate).with_scale(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_profit_is_fifteen_percent() {
        let revenue = BigDecimal::from_str("1000.00").unwrap();
        assert_eq!(
            estimate_net_profit(&revenue),
            BigDecimal::from_str("150.00").unwrap()
        );
    }

    #[test]
    fn test_net_profit_of_zero_revenue() {
        assert_eq!(
            estimate_net_profit(&BigDecimal::from(0)),
            BigDecimal::from(0).with_scale(2)
        );
    }
}
