use crate::database::error::DatabaseError;
use crate::database::repository::UserStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account roles. Agents and Admins buy at wholesale; Agents run shops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Client,
    Agent,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "Client",
            Role::Agent => "Agent",
            Role::Admin => "Admin",
        }
    }

    pub fn buys_wholesale(&self) -> bool {
        matches!(self, Role::Agent | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Client" => Ok(Role::Client),
            "Agent" => Ok(Role::Agent),
            "Admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// User entity. Balances are integer minor units (pesewas) and are only
/// ever mutated through the conditional update methods below.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub wallet_balance: i64,
    pub payout_balance: i64,
    pub role: String,
    pub shop_slug: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Parsed role; unknown database values degrade to Client, the most
    /// restricted role.
    pub fn role_kind(&self) -> Role {
        Role::from_str(&self.role).unwrap_or(Role::Client)
    }

    pub fn is_admin(&self) -> bool {
        self.role_kind() == Role::Admin
    }
}

/// Repository for managing user accounts and wallet balances
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users
             (username, email, password_hash, wallet_balance, payout_balance, role)
             VALUES ($1, $2, $3, 0, 0, 'Client')
             RETURNING id, username, email, password_hash, wallet_balance,
                       payout_balance, role, shop_slug, created_at",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, wallet_balance,
                    payout_balance, role, shop_slug, created_at
             FROM users
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, wallet_balance,
                    payout_balance, role, shop_slug, created_at
             FROM users
             WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn identity_exists(&self, username: &str, email: &str) -> Result<bool, DatabaseError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn debit_wallet(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError> {
        // The balance guard lives inside the UPDATE so racing debits
        // cannot overdraw the wallet.
        sqlx::query_scalar::<_, i64>(
            "UPDATE users
             SET wallet_balance = wallet_balance - $2
             WHERE id = $1 AND wallet_balance >= $2
             RETURNING wallet_balance",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn credit_wallet(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE users
             SET wallet_balance = wallet_balance + $2
             WHERE id = $1
             RETURNING wallet_balance",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn debit_payout(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE users
             SET payout_balance = payout_balance - $2
             WHERE id = $1 AND payout_balance >= $2
             RETURNING payout_balance",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn credit_payout(&self, id: Uuid, amount: i64) -> Result<Option<i64>, DatabaseError> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE users
             SET payout_balance = payout_balance + $2
             WHERE id = $1
             RETURNING payout_balance",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_shop_slug(&self, id: Uuid, slug: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET shop_slug = $2 WHERE id = $1")
            .bind(id)
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> Result<Vec<User>, DatabaseError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, wallet_balance,
                    payout_balance, role, shop_slug, created_at
             FROM users
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
    }
}
