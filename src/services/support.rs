//! Support tickets.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::database::repository::TicketStore;
use crate::database::support_ticket_repository::{SupportTicket, TicketWithUser};
use crate::error::{AppError, AppResult, DomainError, ValidationError};

pub struct SupportService {
    tickets: Arc<dyn TicketStore>,
}

impl SupportService {
    pub fn new(tickets: Arc<dyn TicketStore>) -> Self {
        Self { tickets }
    }

    pub async fn open_ticket(
        &self,
        user_id: Uuid,
        subject: &str,
        message: &str,
    ) -> AppResult<SupportTicket> {
        let subject = subject.trim();
        let message = message.trim();
        for (field, value) in [("subject", subject), ("message", message)] {
            if value.is_empty() {
                return Err(AppError::validation(ValidationError::MissingField {
                    field: field.to_string(),
                }));
            }
        }

        let ticket = self.tickets.create(user_id, subject, message).await?;
        info!(ticket_id = %ticket.id, user_id = %user_id, "support ticket opened");
        Ok(ticket)
    }

    pub async fn my_tickets(&self, user_id: Uuid) -> AppResult<Vec<SupportTicket>> {
        Ok(self.tickets.list_by_user(user_id).await?)
    }

    pub async fn all_tickets(&self) -> AppResult<Vec<TicketWithUser>> {
        Ok(self.tickets.list_all_with_user().await?)
    }

    /// Open -> Closed exactly once.
    pub async fn close_ticket(&self, ticket_id: Uuid) -> AppResult<SupportTicket> {
        self.tickets
            .close(ticket_id)
            .await?
            .ok_or_else(|| AppError::domain(DomainError::TicketNotFound {
                ticket_id: ticket_id.to_string(),
            }))
    }
}
