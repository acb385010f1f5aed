//! Wallet funding and commission withdrawals.
//!
//! Top-ups credit the main wallet only after the gateway confirms the
//! money, keyed by payment reference so a replayed callback cannot
//! credit twice. Withdrawals debit the payout wallet with the same
//! conditional-update guard the purchase path uses.

use bigdecimal::BigDecimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::BusinessConfig;
use crate::database::order_repository::{NewOrder, Order};
use crate::database::repository::{OrderStore, UserStore, WithdrawalStore};
use crate::database::withdrawal_repository::Withdrawal;
use crate::error::{AppError, AppResult, DomainError, ValidationError, WalletKind};
use crate::payments::PaymentVerifier;
use crate::pricing::ghs_to_minor;
use crate::services::order_status::OrderStatus;
use crate::services::purchase::PAYMENT_METHOD_PAYSTACK;

/// Top-up orders are funding records, not data orders, and carry these
/// placeholder fields.
const TOPUP_NETWORK: &str = "WALLET";
const TOPUP_PHONE: &str = "Wallet";
const TOPUP_PLAN: &str = "Wallet Funding";

#[derive(Debug, Clone)]
pub struct WithdrawRequest {
    pub amount: BigDecimal,
    pub account_number: String,
    pub account_name: String,
    pub network: String,
}

#[derive(Debug, Clone)]
pub struct TopUpOutcome {
    pub order: Order,
    pub new_balance: i64,
}

#[derive(Debug, Clone)]
pub struct WithdrawOutcome {
    pub withdrawal: Withdrawal,
    pub new_payout_balance: i64,
}

pub struct WalletService {
    users: Arc<dyn UserStore>,
    orders: Arc<dyn OrderStore>,
    withdrawals: Arc<dyn WithdrawalStore>,
    verifier: Arc<dyn PaymentVerifier>,
    business: BusinessConfig,
}

impl WalletService {
    pub fn new(
        users: Arc<dyn UserStore>,
        orders: Arc<dyn OrderStore>,
        withdrawals: Arc<dyn WithdrawalStore>,
        verifier: Arc<dyn PaymentVerifier>,
        business: BusinessConfig,
    ) -> Self {
        Self {
            users,
            orders,
            withdrawals,
            verifier,
            business,
        }
    }

    /// Credit the main wallet after a verified gateway payment. The
    /// funding record is born terminal; it never goes through delivery.
    pub async fn top_up(
        &self,
        user_id: Uuid,
        reference: &str,
        amount: BigDecimal,
    ) -> AppResult<TopUpOutcome> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AppError::validation(ValidationError::MissingField {
                field: "reference".to_string(),
            }));
        }
        if amount <= BigDecimal::from(0) {
            return Err(AppError::validation(ValidationError::InvalidAmount {
                amount: amount.to_string(),
                reason: "top-up amount must be positive".to_string(),
            }));
        }

        // Fast path for obvious replays; the real guard is the unique
        // reference on the funding record below.
        if self.orders.reference_exists(reference).await? {
            warn!(reference = %reference, "top-up replay rejected");
            return Err(AppError::domain(DomainError::DuplicateReference {
                reference: reference.to_string(),
            }));
        }

        let verified = self.verifier.verify(reference).await?;
        if !verified.status.is_success() {
            return Err(AppError::domain(DomainError::VerificationFailed {
                reference: reference.to_string(),
                reason: "payment not successful".to_string(),
            }));
        }
        let amount_minor = ghs_to_minor(&amount);
        if !verified.covers(amount_minor) {
            return Err(AppError::domain(DomainError::VerificationFailed {
                reference: reference.to_string(),
                reason: format!(
                    "paid {} pesewas but the top-up claims {}",
                    verified.amount_minor, amount_minor
                ),
            }));
        }

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::domain(DomainError::UserNotFound {
                user_id: user_id.to_string(),
            }));
        }

        // The funding record is inserted before the credit: its unique
        // reference is the claim on this payment, so a concurrent replay
        // loses here without touching the balance.
        let order = match self
            .orders
            .create(&NewOrder {
                user_id: Some(user_id),
                reference: reference.to_string(),
                phone_number: TOPUP_PHONE.to_string(),
                network: TOPUP_NETWORK.to_string(),
                plan_name: TOPUP_PLAN.to_string(),
                amount,
                profit: BigDecimal::from(0),
                status: OrderStatus::TopupSuccessful.as_str().to_string(),
                payment_method: PAYMENT_METHOD_PAYSTACK.to_string(),
                shop_slug: None,
            })
            .await
        {
            Ok(order) => order,
            Err(err) if err.is_unique_violation() => {
                warn!(reference = %reference, "top-up replay rejected");
                return Err(AppError::domain(DomainError::DuplicateReference {
                    reference: reference.to_string(),
                }));
            }
            Err(err) => return Err(err.into()),
        };

        let new_balance = self
            .users
            .credit_wallet(user_id, amount_minor)
            .await?
            .ok_or_else(|| AppError::domain(DomainError::UserNotFound {
                user_id: user_id.to_string(),
            }))?;

        info!(
            user_id = %user_id,
            reference = %reference,
            amount_minor = amount_minor,
            new_balance = new_balance,
            "wallet funded"
        );

        Ok(TopUpOutcome { order, new_balance })
    }

    /// Request a payout of earned commission. Funds leave the payout
    /// wallet immediately; an admin later marks the transfer Paid.
    pub async fn withdraw(
        &self,
        user_id: Uuid,
        request: WithdrawRequest,
    ) -> AppResult<WithdrawOutcome> {
        for (field, value) in [
            ("account_number", &request.account_number),
            ("account_name", &request.account_name),
            ("network", &request.network),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(ValidationError::MissingField {
                    field: field.to_string(),
                }));
            }
        }

        let amount_minor = ghs_to_minor(&request.amount);
        let minimum_minor = ghs_to_minor(&self.business.min_withdrawal);
        if amount_minor < minimum_minor {
            return Err(AppError::domain(DomainError::WithdrawalBelowMinimum {
                minimum: minimum_minor,
                requested: amount_minor,
            }));
        }

        let new_payout_balance = match self.users.debit_payout(user_id, amount_minor).await? {
            Some(balance) => balance,
            None => {
                let available = self
                    .users
                    .find_by_id(user_id)
                    .await?
                    .map(|u| u.payout_balance)
                    .unwrap_or(0);
                return Err(AppError::domain(DomainError::InsufficientFunds {
                    wallet: WalletKind::Payout,
                    available,
                    required: amount_minor,
                }));
            }
        };

        let withdrawal = self
            .withdrawals
            .create(
                user_id,
                request.amount.clone(),
                request.account_number.trim(),
                request.account_name.trim(),
                request.network.trim(),
            )
            .await?;

        info!(
            user_id = %user_id,
            withdrawal_id = %withdrawal.id,
            amount_minor = amount_minor,
            new_payout_balance = new_payout_balance,
            "withdrawal requested"
        );

        Ok(WithdrawOutcome {
            withdrawal,
            new_payout_balance,
        })
    }
}
