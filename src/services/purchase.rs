//! Purchase orchestration, the funds-critical core of the platform.
//!
//! Wallet purchases follow debit -> deliver -> refund-on-failure: the
//! order is recorded PROCESSING before any money moves, the debit is an
//! atomic conditional update, and every classified delivery failure
//! credits the exact debited amount back. Money is never left debited
//! without either a delivered order or a refund; the one remaining gap
//! is a process crash mid-flow, which strands a PROCESSING order for
//! manual admin correction.
//!
//! Direct (guest) purchases swap the wallet precondition for gateway
//! verification and have no refund leg, because no wallet was touched.

use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::database::order_repository::{NewOrder, Order};
use crate::database::repository::{OrderStore, ShopStore, UserStore};
use crate::database::user_repository::Role;
use crate::delivery::{DeliveryProvider, DeliveryRequest};
use crate::error::{AppError, AppResult, DomainError, ValidationError, WalletKind};
use crate::payments::PaymentVerifier;
use crate::pricing::{
    self, find_plan, ghs_to_minor, ghs_to_minor_floor, minor_to_ghs, Network, PriceTier,
};
use crate::services::order_status::OrderStatus;

pub const PAYMENT_METHOD_WALLET: &str = "wallet";
pub const PAYMENT_METHOD_PAYSTACK: &str = "paystack";

/// What a buyer submits
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub network: String,
    pub plan_id: String,
    pub phone: String,
    pub shop_slug: Option<String>,
}

/// Result of a completed purchase
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    pub order: Order,
    /// Wallet balance after the debit, for wallet purchases
    pub new_balance: Option<i64>,
}

/// Resolved price for one purchase
#[derive(Debug, Clone)]
struct PriceQuote {
    network: Network,
    plan_name: String,
    capacity: u32,
    /// What the buyer is charged, decimal GHS
    price: BigDecimal,
    /// Agent markup over wholesale, >= 0
    commission: BigDecimal,
    /// Shop owner to credit when commission > 0
    agent_id: Option<Uuid>,
    shop_slug: Option<String>,
}

pub struct PurchaseService {
    users: Arc<dyn UserStore>,
    orders: Arc<dyn OrderStore>,
    shops: Arc<dyn ShopStore>,
    delivery: Arc<dyn DeliveryProvider>,
    verifier: Arc<dyn PaymentVerifier>,
}

impl PurchaseService {
    pub fn new(
        users: Arc<dyn UserStore>,
        orders: Arc<dyn OrderStore>,
        shops: Arc<dyn ShopStore>,
        delivery: Arc<dyn DeliveryProvider>,
        verifier: Arc<dyn PaymentVerifier>,
    ) -> Self {
        Self {
            users,
            orders,
            shops,
            delivery,
            verifier,
        }
    }

    /// Wallet-funded purchase for an authenticated user
    pub async fn purchase_with_wallet(
        &self,
        user_id: Uuid,
        request: PurchaseRequest,
    ) -> AppResult<PurchaseOutcome> {
        validate_phone(&request.phone)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::domain(DomainError::UserNotFound {
                user_id: user_id.to_string(),
            }))?;

        let quote = self.resolve_quote(user.role_kind(), &request).await?;
        let cost = ghs_to_minor(&quote.price);

        // Early check for a friendly error message; the real guard is
        // the conditional debit below.
        if user.wallet_balance < cost {
            return Err(AppError::domain(DomainError::InsufficientFunds {
                wallet: WalletKind::Main,
                available: user.wallet_balance,
                required: cost,
            }));
        }

        let reference = format!("ORD-{}", chrono::Utc::now().timestamp_millis());
        let order = self
            .orders
            .create(&NewOrder {
                user_id: Some(user.id),
                reference: reference.clone(),
                phone_number: request.phone.clone(),
                network: quote.network.as_str().to_string(),
                plan_name: quote.plan_name.clone(),
                amount: quote.price.clone(),
                profit: quote.commission.clone(),
                status: OrderStatus::Processing.as_str().to_string(),
                payment_method: PAYMENT_METHOD_WALLET.to_string(),
                shop_slug: quote.shop_slug.clone(),
            })
            .await?;

        let new_balance = match self.users.debit_wallet(user.id, cost).await? {
            Some(balance) => balance,
            None => {
                // A racing purchase drained the wallet between the read
                // and the guard. Nothing was debited.
                self.orders
                    .update_status(order.id, OrderStatus::DataFailed.as_str(), None)
                    .await?;
                return Err(AppError::domain(DomainError::InsufficientFunds {
                    wallet: WalletKind::Main,
                    available: user.wallet_balance,
                    required: cost,
                }));
            }
        };

        info!(
            order_id = %order.id,
            reference = %reference,
            cost_minor = cost,
            new_balance = new_balance,
            "wallet debited, attempting delivery"
        );

        let delivery_request = DeliveryRequest {
            network: quote.network,
            capacity: quote.capacity,
            recipient: request.phone.clone(),
            client_ref: reference.clone(),
        };

        match self.delivery.deliver(&delivery_request).await {
            Ok(receipt) => {
                let order = self
                    .orders
                    .update_status(
                        order.id,
                        OrderStatus::DataSent.as_str(),
                        receipt.external_ref.as_deref(),
                    )
                    .await?;
                self.credit_commission(&quote, &order).await?;
                info!(order_id = %order.id, reference = %order.reference, "data sent");
                Ok(PurchaseOutcome {
                    order,
                    new_balance: Some(new_balance),
                })
            }
            Err(delivery_err) => {
                warn!(
                    order_id = %order.id,
                    error = %delivery_err,
                    "delivery failed, refunding wallet"
                );
                // The compensation leg. If the refund itself fails the
                // order stays PROCESSING with funds debited, which is
                // exactly what admin reconciliation looks for.
                if let Err(refund_err) = self.users.credit_wallet(user.id, cost).await {
                    error!(
                        order_id = %order.id,
                        user_id = %user.id,
                        cost_minor = cost,
                        error = %refund_err,
                        "refund failed after delivery failure; order left PROCESSING"
                    );
                    return Err(AppError::from(refund_err)
                        .with_context(format!("refund of order {} failed", order.reference)));
                }
                self.orders
                    .update_status(order.id, OrderStatus::DataFailed.as_str(), None)
                    .await?;
                Err(delivery_err.into())
            }
        }
    }

    /// Gateway-funded purchase for a guest. No wallet is touched, so
    /// there is no refund leg; a delivery failure leaves the order
    /// data_failed and the customer is compensated out-of-band.
    pub async fn purchase_direct(
        &self,
        reference: &str,
        request: PurchaseRequest,
    ) -> AppResult<PurchaseOutcome> {
        validate_phone(&request.phone)?;
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AppError::validation(ValidationError::MissingField {
                field: "reference".to_string(),
            }));
        }

        if self.orders.reference_exists(reference).await? {
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
        let paid = minor_to_ghs(verified.amount_minor);

        // Guests buying through a shop link pay the shop price against
        // a wholesale base; everyone else pays retail.
        let quote = self.resolve_quote(Role::Client, &request).await?;
        let expected = ghs_to_minor(&quote.price);
        if verified.amount_minor < expected {
            return Err(AppError::domain(DomainError::VerificationFailed {
                reference: reference.to_string(),
                reason: format!(
                    "paid {} pesewas but the plan costs {}",
                    verified.amount_minor, expected
                ),
            }));
        }

        // Commission is the margin on what was actually paid.
        let commission = if quote.agent_id.is_some() {
            let wholesale_cost = &quote.price - &quote.commission;
            let margin = &paid - wholesale_cost;
            if margin > BigDecimal::from(0) {
                margin
            } else {
                BigDecimal::from(0)
            }
        } else {
            BigDecimal::from(0)
        };

        // The unique reference settles races between concurrent replays
        // of the same callback; only one insert wins.
        let order = match self
            .orders
            .create(&NewOrder {
                user_id: None,
                reference: reference.to_string(),
                phone_number: request.phone.clone(),
                network: quote.network.as_str().to_string(),
                plan_name: quote.plan_name.clone(),
                amount: paid,
                profit: commission.clone(),
                status: OrderStatus::Processing.as_str().to_string(),
                payment_method: PAYMENT_METHOD_PAYSTACK.to_string(),
                shop_slug: quote.shop_slug.clone(),
            })
            .await
        {
            Ok(order) => order,
            Err(err) if err.is_unique_violation() => {
                warn!(reference = %reference, "duplicate payment reference rejected");
                return Err(AppError::domain(DomainError::DuplicateReference {
                    reference: reference.to_string(),
                }));
            }
            Err(err) => return Err(err.into()),
        };

        let delivery_request = DeliveryRequest {
            network: quote.network,
            capacity: quote.capacity,
            recipient: request.phone.clone(),
            client_ref: reference.to_string(),
        };

        match self.delivery.deliver(&delivery_request).await {
            Ok(_receipt) => {
                // The gateway reference stays on the order; it is the
                // replay key for this payment.
                let order = self
                    .orders
                    .update_status(order.id, OrderStatus::DataSent.as_str(), None)
                    .await?;
                let quote = PriceQuote {
                    commission,
                    ..quote
                };
                self.credit_commission(&quote, &order).await?;
                info!(order_id = %order.id, "guest purchase delivered");
                Ok(PurchaseOutcome {
                    order,
                    new_balance: None,
                })
            }
            Err(delivery_err) => {
                warn!(
                    order_id = %order.id,
                    error = %delivery_err,
                    "guest purchase delivery failed"
                );
                self.orders
                    .update_status(order.id, OrderStatus::DataFailed.as_str(), None)
                    .await?;
                Err(delivery_err.into())
            }
        }
    }

    pub async fn my_orders(&self, user_id: Uuid) -> AppResult<Vec<Order>> {
        Ok(self.orders.list_by_user(user_id).await?)
    }

    /// Effective price for this caller: shop override beats wholesale
    /// on shop purchases, otherwise wholesale for agents/admins and
    /// retail for clients.
    async fn resolve_quote(&self, role: Role, request: &PurchaseRequest) -> AppResult<PriceQuote> {
        let network = Network::parse(&request.network).ok_or_else(|| {
            AppError::domain(DomainError::InvalidPlan {
                network: request.network.clone(),
                plan_id: request.plan_id.clone(),
            })
        })?;
        let capacity = pricing::plan_capacity(&request.plan_id).ok_or_else(|| {
            AppError::domain(DomainError::InvalidPlan {
                network: request.network.clone(),
                plan_id: request.plan_id.clone(),
            })
        })?;
        let invalid_plan = || {
            AppError::domain(DomainError::InvalidPlan {
                network: request.network.clone(),
                plan_id: request.plan_id.clone(),
            })
        };

        if let (Some(slug), Role::Client) = (request.shop_slug.as_deref(), role) {
            let shop = self
                .shops
                .find_by_slug(slug)
                .await?
                .ok_or_else(|| AppError::domain(DomainError::ShopNotFound {
                    slug: slug.to_string(),
                }))?;

            let base = find_plan(PriceTier::Wholesale, network, &request.plan_id)
                .ok_or_else(invalid_plan)?;
            // An unparseable override is treated as unset.
            let price = shop
                .price_override(&request.plan_id)
                .and_then(|raw| BigDecimal::from_str(raw).ok())
                .unwrap_or_else(|| base.price.clone());
            let commission = if price > base.price {
                &price - &base.price
            } else {
                BigDecimal::from(0)
            };

            return Ok(PriceQuote {
                network,
                plan_name: base.name.to_string(),
                capacity,
                price,
                commission,
                agent_id: Some(shop.user_id),
                shop_slug: Some(shop.slug),
            });
        }

        let tier = if role.buys_wholesale() {
            PriceTier::Wholesale
        } else {
            PriceTier::Retail
        };
        let plan = find_plan(tier, network, &request.plan_id).ok_or_else(invalid_plan)?;

        Ok(PriceQuote {
            network,
            plan_name: plan.name.to_string(),
            capacity,
            price: plan.price,
            commission: BigDecimal::from(0),
            agent_id: None,
            shop_slug: request.shop_slug.clone(),
        })
    }

    /// Credit the shop owner's payout wallet after a delivered shop
    /// sale. Floored to whole pesewas, exactly once per order.
    async fn credit_commission(&self, quote: &PriceQuote, order: &Order) -> AppResult<()> {
        let Some(agent_id) = quote.agent_id else {
            return Ok(());
        };
        let commission_minor = ghs_to_minor_floor(&quote.commission);
        if commission_minor <= 0 {
            return Ok(());
        }

        match self.users.credit_payout(agent_id, commission_minor).await? {
            Some(balance) => {
                info!(
                    order_id = %order.id,
                    agent_id = %agent_id,
                    commission_minor = commission_minor,
                    payout_balance = balance,
                    "commission credited"
                );
            }
            None => {
                // The agent account vanished after the shop lookup;
                // the sale itself already succeeded.
                error!(
                    order_id = %order.id,
                    agent_id = %agent_id,
                    "commission credit skipped: agent not found"
                );
            }
        }
        Ok(())
    }
}

/// Ghanaian mobile number: local 10-digit (0XXXXXXXXX) or international
/// 233 form.
fn validate_phone(phone: &str) -> AppResult<()> {
    let digits: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    let ok = (digits.len() == 10 && digits.starts_with('0'))
        || (digits.len() == 12 && digits.starts_with("233"));

    if ok {
        Ok(())
    } else {
        Err(AppError::validation(ValidationError::InvalidPhoneNumber {
            phone: phone.to_string(),
            reason: "expected a 10-digit local number or 233-prefixed international number"
                .to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_validation() {
        assert!(validate_phone("0241234567").is_ok());
        assert!(validate_phone("+233241234567").is_ok());
        assert!(validate_phone("024 123 4567").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("1241234567").is_err());
        assert!(validate_phone("").is_err());
    }
}
