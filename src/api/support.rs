//! Support ticket endpoints for account holders.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::AppState;
use crate::database::support_ticket_repository::SupportTicket;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct OpenTicketBody {
    pub subject: String,
    pub message: String,
}

pub async fn open_ticket(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(body): Json<OpenTicketBody>,
) -> AppResult<Json<SupportTicket>> {
    let ticket = state
        .support
        .open_ticket(session.user_id, &body.subject, &body.message)
        .await?;
    Ok(Json(ticket))
}

pub async fn my_tickets(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> AppResult<Json<Vec<SupportTicket>>> {
    Ok(Json(state.support.my_tickets(session.user_id).await?))
}
