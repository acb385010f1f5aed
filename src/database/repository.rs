//! Store traits the service layer depends on.
//!
//! Each Postgres repository implements its trait; tests substitute
//! in-memory fakes. Balance mutations are conditional updates: debits
//! return `None` when the balance guard fails, credits return `None`
//! when the user does not exist.

use async_trait::async_trait;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::database::error::DatabaseError;
use crate::database::order_repository::{NewOrder, Order, OrderWithUser};
use crate::database::session_repository::SessionUser;
use crate::database::shop_repository::Shop;
use crate::database::support_ticket_repository::{SupportTicket, TicketWithUser};
use crate::database::user_repository::{Role, User};
use crate::database::withdrawal_repository::{Withdrawal, WithdrawalWithUser};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn identity_exists(&self, username: &str, email: &str) -> Result<bool, DatabaseError>;

    /// Atomically debit the main wallet. `None` means the guard failed:
    /// the balance was below `amount` and nothing changed.
    async fn debit_wallet(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError>;

    async fn credit_wallet(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError>;

    /// Atomically debit the commission payout wallet; same guard
    /// semantics as `debit_wallet`.
    async fn debit_payout(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError>;

    async fn credit_payout(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError>;

    async fn set_role(&self, id: Uuid, role: Role) -> Result<bool, DatabaseError>;

    async fn set_shop_slug(&self, id: Uuid, slug: &str) -> Result<bool, DatabaseError>;

    async fn list_all(&self) -> Result<Vec<User>, DatabaseError>;

    async fn count(&self) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, new_order: &NewOrder) -> Result<Order, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DatabaseError>;

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>, DatabaseError>;

    async fn reference_exists(&self, reference: &str) -> Result<bool, DatabaseError>;

    /// Set the order status, optionally rewriting the reference to the
    /// delivery provider's external one.
    async fn update_status(
        &self,
        id: Uuid,
        status: &str,
        new_reference: Option<&str>,
    ) -> Result<Order, DatabaseError>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, DatabaseError>;

    async fn list_recent_with_user(&self, limit: i64)
        -> Result<Vec<OrderWithUser>, DatabaseError>;

    async fn count(&self) -> Result<i64, DatabaseError>;

    /// Sum of `amount` over data_sent orders, in GHS.
    async fn sum_delivered_revenue(&self) -> Result<BigDecimal, DatabaseError>;
}

#[async_trait]
pub trait ShopStore: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        slug: &str,
        name: &str,
        custom_prices: serde_json::Value,
    ) -> Result<Shop, DatabaseError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Shop>, DatabaseError>;

    async fn find_by_owner(&self, user_id: Uuid) -> Result<Option<Shop>, DatabaseError>;

    async fn update(
        &self,
        id: Uuid,
        slug: &str,
        name: &str,
        custom_prices: serde_json::Value,
    ) -> Result<Shop, DatabaseError>;

    async fn slug_taken_by_other(&self, slug: &str, owner_id: Uuid)
        -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait WithdrawalStore: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        amount: BigDecimal,
        account_number: &str,
        account_name: &str,
        network: &str,
    ) -> Result<Withdrawal, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Withdrawal>, DatabaseError>;

    async fn list_all_with_user(&self) -> Result<Vec<WithdrawalWithUser>, DatabaseError>;

    /// Pending -> Paid exactly once; `None` when the withdrawal was not
    /// in Pending (or does not exist).
    async fn approve(&self, id: Uuid) -> Result<Option<Withdrawal>, DatabaseError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(
        &self,
        token_hash: &str,
        user_id: Uuid,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), DatabaseError>;

    /// Look up an unexpired session by token digest.
    async fn resolve(&self, token_hash: &str) -> Result<Option<SessionUser>, DatabaseError>;

    async fn delete(&self, token_hash: &str) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        subject: &str,
        message: &str,
    ) -> Result<SupportTicket, DatabaseError>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SupportTicket>, DatabaseError>;

    async fn list_all_with_user(&self) -> Result<Vec<TicketWithUser>, DatabaseError>;

    /// Open -> Closed exactly once; `None` when the ticket was not open.
    async fn close(&self, id: Uuid) -> Result<Option<SupportTicket>, DatabaseError>;
}
