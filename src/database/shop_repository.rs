use crate::database::error::DatabaseError;
use crate::database::repository::ShopStore;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Agent shop entity. `custom_prices` is a JSON map of plan-id to
/// override price string (e.g. {"5GB": "32.00"}), layered over the
/// wholesale list at purchase time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Shop {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slug: String,
    pub name: String,
    pub custom_prices: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Shop {
    /// Custom price override for a plan, if one is set and non-empty.
    pub fn price_override(&self, plan_id: &str) -> Option<&str> {
        self.custom_prices
            .get(plan_id)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Repository for agent shops
pub struct ShopRepository {
    pool: PgPool,
}

impl ShopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopStore for ShopRepository {
    async fn create(
        &self,
        user_id: Uuid,
        slug: &str,
        name: &str,
        custom_prices: serde_json::Value,
    ) -> Result<Shop, DatabaseError> {
        sqlx::query_as::<_, Shop>(
            "INSERT INTO shops (user_id, slug, name, custom_prices)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, slug, name, custom_prices, created_at",
        )
        .bind(user_id)
        .bind(slug)
        .bind(name)
        .bind(custom_prices)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Shop>, DatabaseError> {
        sqlx::query_as::<_, Shop>(
            "SELECT id, user_id, slug, name, custom_prices, created_at
             FROM shops
             WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_owner(&self, user_id: Uuid) -> Result<Option<Shop>, DatabaseError> {
        sqlx::query_as::<_, Shop>(
            "SELECT id, user_id, slug, name, custom_prices, created_at
             FROM shops
             WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn update(
        &self,
        id: Uuid,
        slug: &str,
        name: &str,
        custom_prices: serde_json::Value,
    ) -> Result<Shop, DatabaseError> {
        sqlx::query_as::<_, Shop>(
            "UPDATE shops
             SET slug = $2, name = $3, custom_prices = $4
             WHERE id = $1
             RETURNING id, user_id, slug, name, custom_prices, created_at",
        )
        .bind(id)
        .bind(slug)
        .bind(name)
        .bind(custom_prices)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn slug_taken_by_other(&self, slug: &str, owner_id: Uuid) -> Result<bool, DatabaseError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM shops WHERE slug = $1 AND user_id != $2)",
        )
        .bind(slug)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
