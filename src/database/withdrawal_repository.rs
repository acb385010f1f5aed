use crate::database::error::DatabaseError;
use crate::database::repository::WithdrawalStore;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{types::BigDecimal, FromRow, PgPool};
use uuid::Uuid;

pub const WITHDRAWAL_PENDING: &str = "Pending";
pub const WITHDRAWAL_PAID: &str = "Paid";

/// Withdrawal request entity. The requested amount is reserved by
/// debiting the payout balance at creation time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Withdrawal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub account_number: String,
    pub account_name: String,
    pub network: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Withdrawal joined with the requesting username, for the admin queue
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WithdrawalWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub account_number: String,
    pub account_name: String,
    pub network: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub username: String,
}

/// Repository for withdrawal requests
pub struct WithdrawalRepository {
    pool: PgPool,
}

impl WithdrawalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WithdrawalStore for WithdrawalRepository {
    async fn create(
        &self,
        user_id: Uuid,
        amount: BigDecimal,
        account_number: &str,
        account_name: &str,
        network: &str,
    ) -> Result<Withdrawal, DatabaseError> {
        sqlx::query_as::<_, Withdrawal>(
            "INSERT INTO withdrawals
             (user_id, amount, account_number, account_name, network, status)
             VALUES ($1, $2, $3, $4, $5, 'Pending')
             RETURNING id, user_id, amount, account_number, account_name,
                       network, status, created_at",
        )
        .bind(user_id)
        .bind(amount)
        .bind(account_number)
        .bind(account_name)
        .bind(network)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Withdrawal>, DatabaseError> {
        sqlx::query_as::<_, Withdrawal>(
            "SELECT id, user_id, amount, account_number, account_name,
                    network, status, created_at
             FROM withdrawals
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn list_all_with_user(&self) -> Result<Vec<WithdrawalWithUser>, DatabaseError> {
        sqlx::query_as::<_, WithdrawalWithUser>(
            "SELECT w.id, w.user_id, w.amount, w.account_number, w.account_name,
                    w.network, w.status, w.created_at, u.username
             FROM withdrawals w
             JOIN users u ON u.id = w.user_id
             ORDER BY w.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn approve(&self, id: Uuid) -> Result<Option<Withdrawal>, DatabaseError> {
        // Pending -> Paid exactly once; a second approval matches no row.
        sqlx::query_as::<_, Withdrawal>(
            "UPDATE withdrawals
             SET status = 'Paid'
             WHERE id = $1 AND status = 'Pending'
             RETURNING id, user_id, amount, account_number, account_name,
                       network, status, created_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
