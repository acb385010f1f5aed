use crate::database::error::DatabaseError;
use crate::database::repository::TicketStore;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

pub const TICKET_OPEN: &str = "Open";
pub const TICKET_CLOSED: &str = "Closed";

/// Support ticket entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SupportTicket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Ticket joined with the author's username, for the admin view
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TicketWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub username: String,
}

/// Repository for support tickets
pub struct SupportTicketRepository {
    pool: PgPool,
}

impl SupportTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for SupportTicketRepository {
    async fn create(
        &self,
        user_id: Uuid,
        subject: &str,
        message: &str,
    ) -> Result<SupportTicket, DatabaseError> {
        sqlx::query_as::<_, SupportTicket>(
            "INSERT INTO support_tickets (user_id, subject, message, status)
             VALUES ($1, $2, $3, 'Open')
             RETURNING id, user_id, subject, message, status, created_at",
        )
        .bind(user_id)
        .bind(subject)
        .bind(message)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SupportTicket>, DatabaseError> {
        sqlx::query_as::<_, SupportTicket>(
            "SELECT id, user_id, subject, message, status, created_at
             FROM support_tickets
             WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn list_all_with_user(&self) -> Result<Vec<TicketWithUser>, DatabaseError> {
        sqlx::query_as::<_, TicketWithUser>(
            "SELECT t.id, t.user_id, t.subject, t.message, t.status,
                    t.created_at, u.username
             FROM support_tickets t
             JOIN users u ON u.id = t.user_id
             ORDER BY t.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn close(&self, id: Uuid) -> Result<Option<SupportTicket>, DatabaseError> {
        sqlx::query_as::<_, SupportTicket>(
            "UPDATE support_tickets
             SET status = 'Closed'
             WHERE id = $1 AND status = 'Open'
             RETURNING id, user_id, subject, message, status, created_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
