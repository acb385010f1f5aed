use crate::database::error::DatabaseError;
use crate::database::repository::OrderStore;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{types::BigDecimal, FromRow, PgPool};
use uuid::Uuid;

/// Order entity: one row per funds-affecting event (purchase, top-up,
/// admin credit). `amount` and `profit` are decimal GHS; `user_id` is
/// absent for guest shop purchases.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub reference: String,
    pub phone_number: String,
    pub network: String,
    pub plan_name: String,
    pub amount: BigDecimal,
    pub profit: BigDecimal,
    pub status: String,
    pub payment_method: String,
    pub shop_slug: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Insert payload for a new order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<Uuid>,
    pub reference: String,
    pub phone_number: String,
    pub network: String,
    pub plan_name: String,
    pub amount: BigDecimal,
    pub profit: BigDecimal,
    pub status: String,
    pub payment_method: String,
    pub shop_slug: Option<String>,
}

/// Order joined with the owning username, for the admin dashboard
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderWithUser {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub reference: String,
    pub phone_number: String,
    pub network: String,
    pub plan_name: String,
    pub amount: BigDecimal,
    pub profit: BigDecimal,
    pub status: String,
    pub payment_method: String,
    pub shop_slug: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub username: Option<String>,
}

/// Repository for the order ledger
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn create(&self, new_order: &NewOrder) -> Result<Order, DatabaseError> {
        sqlx::query_as::<_, Order>(
            "INSERT INTO orders
             (user_id, reference, phone_number, network, plan_name, amount,
              profit, status, payment_method, shop_slug)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING id, user_id, reference, phone_number, network, plan_name,
                       amount, profit, status, payment_method, shop_slug,
                       created_at, updated_at",
        )
        .bind(new_order.user_id)
        .bind(&new_order.reference)
        .bind(&new_order.phone_number)
        .bind(&new_order.network)
        .bind(&new_order.plan_name)
        .bind(&new_order.amount)
        .bind(&new_order.profit)
        .bind(&new_order.status)
        .bind(&new_order.payment_method)
        .bind(&new_order.shop_slug)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DatabaseError> {
        sqlx::query_as::<_, Order>(
            "SELECT id, user_id, reference, phone_number, network, plan_name,
                    amount, profit, status, payment_method, shop_slug,
                    created_at, updated_at
             FROM orders
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>, DatabaseError> {
        sqlx::query_as::<_, Order>(
            "SELECT id, user_id, reference, phone_number, network, plan_name,
                    amount, profit, status, payment_method, shop_slug,
                    created_at, updated_at
             FROM orders
             WHERE reference = $1",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn reference_exists(&self, reference: &str) -> Result<bool, DatabaseError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE reference = $1)",
        )
        .bind(reference)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: &str,
        new_reference: Option<&str>,
    ) -> Result<Order, DatabaseError> {
        // Successful deliveries rewrite the reference to the provider's
        // external one; NULL keeps the existing reference.
        sqlx::query_as::<_, Order>(
            "UPDATE orders
             SET status = $2,
                 reference = COALESCE($3, reference),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING id, user_id, reference, phone_number, network, plan_name,
                       amount, profit, status, payment_method, shop_slug,
                       created_at, updated_at",
        )
        .bind(id)
        .bind(status)
        .bind(new_reference)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, DatabaseError> {
        sqlx::query_as::<_, Order>(
            "SELECT id, user_id, reference, phone_number, network, plan_name,
                    amount, profit, status, payment_method, shop_slug,
                    created_at, updated_at
             FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn list_recent_with_user(&self, limit: i64) -> Result<Vec<OrderWithUser>, DatabaseError> {
        sqlx::query_as::<_, OrderWithUser>(
            "SELECT o.id, o.user_id, o.reference, o.phone_number, o.network,
                    o.plan_name, o.amount, o.profit, o.status, o.payment_method,
                    o.shop_slug, o.created_at, o.updated_at, u.username
             FROM orders o
             LEFT JOIN users u ON u.id = o.user_id
             ORDER BY o.created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
    }

    async fn sum_delivered_revenue(&self) -> Result<BigDecimal, DatabaseError> {
        sqlx::query_scalar::<_, BigDecimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM orders WHERE status = 'data_sent'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
