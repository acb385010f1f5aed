//! Account and session endpoints.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::database::user_repository::User;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::services::SignupRequest;

/// User shape returned to clients. Never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: uuid::Uuid,
    pub username: String,
    pub email: String,
    /// Minor units (pesewas)
    pub wallet_balance: i64,
    pub payout_balance: i64,
    pub role: String,
    pub shop_slug: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            wallet_balance: user.wallet_balance,
            payout_balance: user.payout_balance,
            role: user.role,
            shop_slug: user.shop_slug,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Deserialize)]
pub struct SignupBody {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpgradeBody {
    pub reference: String,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupBody>,
) -> AppResult<Json<SessionResponse>> {
    let session = state
        .auth
        .signup(SignupRequest {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok(Json(SessionResponse {
        token: session.token,
        user: session.user.into(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> AppResult<Json<SessionResponse>> {
    let session = state.auth.login(&body.username, &body.password).await?;

    Ok(Json(SessionResponse {
        token: session.token,
        user: session.user.into(),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> AppResult<Json<serde_json::Value>> {
    if let Some(token) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        state.auth.logout(token.trim()).await?;
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn user_info(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> AppResult<Json<UserView>> {
    let user = state.auth.current_user(session.user_id).await?;
    Ok(Json(user.into()))
}

pub async fn upgrade_agent(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(body): Json<UpgradeBody>,
) -> AppResult<Json<UserView>> {
    let user = state
        .auth
        .upgrade_to_agent(session.user_id, &body.reference)
        .await?;
    Ok(Json(user.into()))
}
