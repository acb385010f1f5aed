//! Session extractors.
//!
//! Handlers declare the access level they need in their signature:
//! `CurrentUser` for any logged-in account, `AdminUser` for admin-only
//! routes. Rejections flow through the standard error response shape.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::str::FromStr;

use crate::api::AppState;
use crate::database::session_repository::SessionUser;
use crate::database::user_repository::Role;
use crate::error::{AppError, DomainError};

/// Any authenticated session
pub struct CurrentUser(pub SessionUser);

/// Authenticated session with the Admin role
pub struct AdminUser(pub SessionUser);

/// Session if a valid token was presented, for routes that serve both
/// guests and logged-in users.
pub struct MaybeUser(pub Option<SessionUser>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<SessionUser, AppError> {
    let token = bearer_token(parts).ok_or_else(|| {
        AppError::domain(DomainError::Unauthorized {
            reason: "missing bearer token".to_string(),
        })
    })?;

    state
        .auth
        .resolve_session(token)
        .await?
        .ok_or_else(|| AppError::domain(DomainError::Unauthorized {
            reason: "session expired or invalid".to_string(),
        }))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await.map(CurrentUser)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => Ok(MaybeUser(state.auth.resolve_session(token).await?)),
            None => Ok(MaybeUser(None)),
        }
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = resolve(parts, state).await?;
        if Role::from_str(&session.role).unwrap_or(Role::Client) != Role::Admin {
            return Err(AppError::domain(DomainError::Forbidden {
                required: "Admin".to_string(),
            }));
        }
        Ok(AdminUser(session))
    }
}
