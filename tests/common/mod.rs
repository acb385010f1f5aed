//! In-memory store fakes and canned external collaborators for
//! service-level integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::BigDecimal;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use uuid::Uuid;

use Datawave_backend::database::error::{DatabaseError, DatabaseErrorKind};
use Datawave_backend::database::order_repository::{NewOrder, Order, OrderWithUser};
use Datawave_backend::database::repository::{
    OrderStore, SessionStore, ShopStore, TicketStore, UserStore, WithdrawalStore,
};
use Datawave_backend::database::session_repository::SessionUser;
use Datawave_backend::database::shop_repository::Shop;
use Datawave_backend::database::support_ticket_repository::{SupportTicket, TicketWithUser};
use Datawave_backend::database::user_repository::{Role, User};
use Datawave_backend::database::withdrawal_repository::{Withdrawal, WithdrawalWithUser};
use Datawave_backend::delivery::{
    DeliveryError, DeliveryProvider, DeliveryReceipt, DeliveryRequest, DeliveryResult,
};
use Datawave_backend::payments::error::{PaymentError, PaymentResult};
use Datawave_backend::payments::{PaymentStatus, PaymentVerifier, VerifiedPayment};

pub fn test_user(username: &str, role: Role, wallet: i64, payout: i64) -> User {
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: "x".to_string(),
        wallet_balance: wallet,
        payout_balance: payout,
        role: role.as_str().to_string(),
        shop_slug: None,
        created_at: Utc::now(),
    }
}

pub fn test_shop(owner: &User, slug: &str, custom_prices: serde_json::Value) -> Shop {
    Shop {
        id: Uuid::new_v4(),
        user_id: owner.id,
        slug: slug.to_string(),
        name: format!("{} shop", owner.username),
        custom_prices,
        created_at: Utc::now(),
    }
}

pub fn paid(reference: &str, amount_minor: i64) -> VerifiedPayment {
    VerifiedPayment {
        reference: reference.to_string(),
        status: PaymentStatus::Success,
        amount_minor,
        currency: "GHS".to_string(),
        channel: Some("mobile_money".to_string()),
        paid_at: None,
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUsers {
    pub fn with(users: Vec<User>) -> Self {
        Self {
            rows: Mutex::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    pub fn balance_of(&self, id: Uuid) -> i64 {
        self.rows.lock().unwrap()[&id].wallet_balance
    }

    pub fn payout_of(&self, id: Uuid) -> i64 {
        self.rows.lock().unwrap()[&id].payout_balance
    }
}

#[async_trait]
impl UserStore for InMemoryUsers {
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DatabaseError> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            wallet_balance: 0,
            payout_balance: 0,
            role: Role::Client.as_str().to_string(),
            shop_slug: None,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn identity_exists(&self, username: &str, email: &str) -> Result<bool, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .any(|u| u.username == username || u.email == email))
    }

    async fn debit_wallet(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(user) if user.wallet_balance >= amount => {
                user.wallet_balance -= amount;
                Ok(Some(user.wallet_balance))
            }
            _ => Ok(None),
        }
    }

    async fn credit_wallet(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(user) => {
                user.wallet_balance += amount;
                Ok(Some(user.wallet_balance))
            }
            None => Ok(None),
        }
    }

    async fn debit_payout(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(user) if user.payout_balance >= amount => {
                user.payout_balance -= amount;
                Ok(Some(user.payout_balance))
            }
            _ => Ok(None),
        }
    }

    async fn credit_payout(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(user) => {
                user.payout_balance += amount;
                Ok(Some(user.payout_balance))
            }
            None => Ok(None),
        }
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<bool, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(user) => {
                user.role = role.as_str().to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_shop_slug(&self, id: Uuid, slug: &str) -> Result<bool, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(user) => {
                user.shop_slug = Some(slug.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_all(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }
}

#[derive(Default)]
pub struct InMemoryOrders {
    rows: Mutex<Vec<Order>>,
}

impl InMemoryOrders {
    pub fn all(&self) -> Vec<Order> {
        self.rows.lock().unwrap().clone()
    }

    pub fn by_reference(&self, reference: &str) -> Option<Order> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.reference == reference)
            .cloned()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrders {
    async fn create(&self, new_order: &NewOrder) -> Result<Order, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        // References carry a unique constraint in the real schema.
        if rows.iter().any(|o| o.reference == new_order.reference) {
            return Err(DatabaseError::new(DatabaseErrorKind::UniqueViolation {
                constraint: "orders_reference_key".to_string(),
            }));
        }
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id: new_order.user_id,
            reference: new_order.reference.clone(),
            phone_number: new_order.phone_number.clone(),
            network: new_order.network.clone(),
            plan_name: new_order.plan_name.clone(),
            amount: new_order.amount.clone(),
            profit: new_order.profit.clone(),
            status: new_order.status.clone(),
            payment_method: new_order.payment_method.clone(),
            shop_slug: new_order.shop_slug.clone(),
            created_at: now,
            updated_at: now,
        };
        rows.push(order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DatabaseError> {
        Ok(self.rows.lock().unwrap().iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>, DatabaseError> {
        Ok(self.by_reference(reference))
    }

    async fn reference_exists(&self, reference: &str) -> Result<bool, DatabaseError> {
        Ok(self.by_reference(reference).is_some())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: &str,
        new_reference: Option<&str>,
    ) -> Result<Order, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        let order = rows.iter_mut().find(|o| o.id == id).ok_or_else(|| {
            DatabaseError::from_sqlx(sqlx::Error::RowNotFound)
        })?;
        order.status = status.to_string();
        if let Some(reference) = new_reference {
            order.reference = reference.to_string();
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn list_recent_with_user(
        &self,
        limit: i64,
    ) -> Result<Vec<OrderWithUser>, DatabaseError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .rev()
            .take(limit as usize)
            .map(|o| OrderWithUser {
                id: o.id,
                user_id: o.user_id,
                reference: o.reference.clone(),
                phone_number: o.phone_number.clone(),
                network: o.network.clone(),
                plan_name: o.plan_name.clone(),
                amount: o.amount.clone(),
                profit: o.profit.clone(),
                status: o.status.clone(),
                payment_method: o.payment_method.clone(),
                shop_slug: o.shop_slug.clone(),
                created_at: o.created_at,
                updated_at: o.updated_at,
                username: None,
            })
            .collect())
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }

    async fn sum_delivered_revenue(&self) -> Result<BigDecimal, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.status == "data_sent")
            .map(|o| o.amount.clone())
            .sum())
    }
}

#[derive(Default)]
pub struct InMemoryShops {
    rows: Mutex<Vec<Shop>>,
}

impl InMemoryShops {
    pub fn with(shops: Vec<Shop>) -> Self {
        Self {
            rows: Mutex::new(shops),
        }
    }
}

#[async_trait]
impl ShopStore for InMemoryShops {
    async fn create(
        &self,
        user_id: Uuid,
        slug: &str,
        name: &str,
        custom_prices: serde_json::Value,
    ) -> Result<Shop, DatabaseError> {
        let shop = Shop {
            id: Uuid::new_v4(),
            user_id,
            slug: slug.to_string(),
            name: name.to_string(),
            custom_prices,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(shop.clone());
        Ok(shop)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Shop>, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.slug == slug)
            .cloned())
    }

    async fn find_by_owner(&self, user_id: Uuid) -> Result<Option<Shop>, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        slug: &str,
        name: &str,
        custom_prices: serde_json::Value,
    ) -> Result<Shop, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        let shop = rows.iter_mut().find(|s| s.id == id).ok_or_else(|| {
            DatabaseError::from_sqlx(sqlx::Error::RowNotFound)
        })?;
        shop.slug = slug.to_string();
        shop.name = name.to_string();
        shop.custom_prices = custom_prices;
        Ok(shop.clone())
    }

    async fn slug_taken_by_other(
        &self,
        slug: &str,
        owner_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.slug == slug && s.user_id != owner_id))
    }
}

#[derive(Default)]
pub struct InMemoryWithdrawals {
    rows: Mutex<Vec<Withdrawal>>,
}

impl InMemoryWithdrawals {
    pub fn all(&self) -> Vec<Withdrawal> {
        self.rows.lock().unwrap().clone()
    }

    pub fn seed(&self, withdrawal: Withdrawal) {
        self.rows.lock().unwrap().push(withdrawal);
    }
}

#[async_trait]
impl WithdrawalStore for InMemoryWithdrawals {
    async fn create(
        &self,
        user_id: Uuid,
        amount: BigDecimal,
        account_number: &str,
        account_name: &str,
        network: &str,
    ) -> Result<Withdrawal, DatabaseError> {
        let withdrawal = Withdrawal {
            id: Uuid::new_v4(),
            user_id,
            amount,
            account_number: account_number.to_string(),
            account_name: account_name.to_string(),
            network: network.to_string(),
            status: "Pending".to_string(),
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(withdrawal.clone());
        Ok(withdrawal)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Withdrawal>, DatabaseError> {
        Ok(self.rows.lock().unwrap().iter().find(|w| w.id == id).cloned())
    }

    async fn list_all_with_user(&self) -> Result<Vec<WithdrawalWithUser>, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|w| WithdrawalWithUser {
                id: w.id,
                user_id: w.user_id,
                amount: w.amount.clone(),
                account_number: w.account_number.clone(),
                account_name: w.account_name.clone(),
                network: w.network.clone(),
                status: w.status.clone(),
                created_at: w.created_at,
                username: "user".to_string(),
            })
            .collect())
    }

    async fn approve(&self, id: Uuid) -> Result<Option<Withdrawal>, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        match rows
            .iter_mut()
            .find(|w| w.id == id && w.status == "Pending")
        {
            Some(withdrawal) => {
                withdrawal.status = "Paid".to_string();
                Ok(Some(withdrawal.clone()))
            }
            None => Ok(None),
        }
    }
}

/// Session fake backed by the user fake so resolved sessions carry the
/// live role.
pub struct InMemorySessions {
    rows: Mutex<HashMap<String, (Uuid, chrono::DateTime<Utc>)>>,
    users: std::sync::Arc<InMemoryUsers>,
}

impl InMemorySessions {
    pub fn new(users: std::sync::Arc<InMemoryUsers>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            users,
        }
    }

    pub fn session_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessions {
    async fn insert(
        &self,
        token_hash: &str,
        user_id: Uuid,
        expires_at: chrono::DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.rows
            .lock()
            .unwrap()
            .insert(token_hash.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn resolve(&self, token_hash: &str) -> Result<Option<SessionUser>, DatabaseError> {
        let entry = self.rows.lock().unwrap().get(token_hash).copied();
        let Some((user_id, expires_at)) = entry else {
            return Ok(None);
        };
        if expires_at <= Utc::now() {
            return Ok(None);
        }
        Ok(self.users.find_by_id(user_id).await?.map(|u| SessionUser {
            user_id: u.id,
            username: u.username,
            role: u.role,
        }))
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        Ok(self.rows.lock().unwrap().remove(token_hash).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryTickets {
    rows: Mutex<Vec<SupportTicket>>,
}

#[async_trait]
impl TicketStore for InMemoryTickets {
    async fn create(
        &self,
        user_id: Uuid,
        subject: &str,
        message: &str,
    ) -> Result<SupportTicket, DatabaseError> {
        let ticket = SupportTicket {
            id: Uuid::new_v4(),
            user_id,
            subject: subject.to_string(),
            message: message.to_string(),
            status: "Open".to_string(),
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(ticket.clone());
        Ok(ticket)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SupportTicket>, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all_with_user(&self) -> Result<Vec<TicketWithUser>, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|t| TicketWithUser {
                id: t.id,
                user_id: t.user_id,
                subject: t.subject.clone(),
                message: t.message.clone(),
                status: t.status.clone(),
                created_at: t.created_at,
                username: "user".to_string(),
            })
            .collect())
    }

    async fn close(&self, id: Uuid) -> Result<Option<SupportTicket>, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|t| t.id == id && t.status == "Open") {
            Some(ticket) => {
                ticket.status = "Closed".to_string();
                Ok(Some(ticket.clone()))
            }
            None => Ok(None),
        }
    }
}

/// Canned payment verifier: known references resolve, everything else
/// is a provider error.
#[derive(Default)]
pub struct MockVerifier {
    payments: Mutex<HashMap<String, VerifiedPayment>>,
    yield_before_reply: bool,
}

impl MockVerifier {
    pub fn with(payments: Vec<VerifiedPayment>) -> Self {
        Self {
            payments: Mutex::new(
                payments
                    .into_iter()
                    .map(|p| (p.reference.clone(), p))
                    .collect(),
            ),
            yield_before_reply: false,
        }
    }

    /// Like `with`, but yields to the scheduler before answering so two
    /// in-flight verifications can interleave.
    pub fn yielding_with(payments: Vec<VerifiedPayment>) -> Self {
        Self {
            yield_before_reply: true,
            ..Self::with(payments)
        }
    }
}

#[async_trait]
impl PaymentVerifier for MockVerifier {
    async fn verify(&self, reference: &str) -> PaymentResult<VerifiedPayment> {
        if self.yield_before_reply {
            tokio::task::yield_now().await;
        }
        self.payments
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| PaymentError::ProviderError {
                provider: "mock".to_string(),
                message: "transaction not found".to_string(),
                provider_code: None,
                retryable: false,
            })
    }
}

/// Scripted delivery provider. Outcomes are consumed in order; once the
/// script runs dry every call succeeds.
#[derive(Default)]
pub struct MockDelivery {
    script: Mutex<VecDeque<DeliveryResult<DeliveryReceipt>>>,
    calls: Mutex<Vec<DeliveryRequest>>,
}

impl MockDelivery {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing_with(err: DeliveryError) -> Self {
        let fake = Self::default();
        fake.script.lock().unwrap().push_back(Err(err));
        fake
    }

    pub fn push(&self, outcome: DeliveryResult<DeliveryReceipt>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<DeliveryRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryProvider for MockDelivery {
    async fn deliver(&self, request: &DeliveryRequest) -> DeliveryResult<DeliveryReceipt> {
        self.calls.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(DeliveryReceipt {
                external_ref: Some("DP-TEST".to_string()),
            }))
    }
}
