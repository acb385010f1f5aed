//! Accounts and sessions.
//!
//! Passwords are hashed with Argon2id. Session tokens are 32 random
//! bytes handed to the client as hex; only the SHA-256 digest of the
//! token touches the database, so a leaked sessions table cannot be
//! replayed.

use argon2::password_hash::{rand_core::OsRng as HashOsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::BusinessConfig;
use crate::database::repository::{SessionStore, UserStore};
use crate::database::session_repository::SessionUser;
use crate::database::user_repository::{Role, User};
use crate::error::{AppError, AppResult, DomainError, ValidationError};
use crate::payments::PaymentVerifier;
use crate::pricing::ghs_to_minor;

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A freshly authenticated session. The token is shown to the client
/// exactly once.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub token: String,
    pub user: User,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    verifier: Arc<dyn PaymentVerifier>,
    business: BusinessConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        verifier: Arc<dyn PaymentVerifier>,
        business: BusinessConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            verifier,
            business,
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> AppResult<AuthenticatedSession> {
        let username = request.username.trim();
        let email = request.email.trim();
        for (field, value) in [
            ("username", username),
            ("email", email),
            ("password", request.password.as_str()),
        ] {
            if value.is_empty() {
                return Err(AppError::validation(ValidationError::MissingField {
                    field: field.to_string(),
                }));
            }
        }

        if self.users.identity_exists(username, email).await? {
            return Err(AppError::domain(DomainError::UserAlreadyExists));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self.users.create(username, email, &password_hash).await?;
        info!(user_id = %user.id, username = %user.username, "account created");

        let token = self.issue_session(user.id).await?;
        Ok(AuthenticatedSession { token, user })
    }

    /// Login deliberately returns the same error whether the username
    /// or the password was wrong.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<AuthenticatedSession> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::domain(DomainError::InvalidCredentials))?;

        if !verify_password(password, &user.password_hash) {
            warn!(username = %username, "failed login attempt");
            return Err(AppError::domain(DomainError::InvalidCredentials));
        }

        let token = self.issue_session(user.id).await?;
        info!(user_id = %user.id, "login");
        Ok(AuthenticatedSession { token, user })
    }

    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.sessions.delete(&token_digest(token)).await?;
        Ok(())
    }

    /// Resolve a bearer token to its session identity, if still valid.
    pub async fn resolve_session(&self, token: &str) -> AppResult<Option<SessionUser>> {
        Ok(self.sessions.resolve(&token_digest(token)).await?)
    }

    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::domain(DomainError::UserNotFound {
                user_id: user_id.to_string(),
            }))
    }

    /// Promote a client to agent after a verified payment of the
    /// configured upgrade fee.
    pub async fn upgrade_to_agent(&self, user_id: Uuid, reference: &str) -> AppResult<User> {
        let user = self.current_user(user_id).await?;
        if user.role_kind() != Role::Client {
            return Err(AppError::domain(DomainError::Forbidden {
                required: "Client".to_string(),
            }));
        }

        let verified = self.verifier.verify(reference).await?;
        let fee_minor = ghs_to_minor(&self.business.agent_upgrade_fee);
        if !verified.status.is_success() || !verified.covers(fee_minor) {
            return Err(AppError::domain(DomainError::VerificationFailed {
                reference: reference.to_string(),
                reason: format!("upgrade fee of {} pesewas not covered", fee_minor),
            }));
        }

        self.users.set_role(user.id, Role::Agent).await?;
        info!(user_id = %user.id, "upgraded to agent");
        self.current_user(user.id).await
    }

    async fn issue_session(&self, user_id: Uuid) -> AppResult<String> {
        let mut raw = [0u8; 32];
        OsRng.fill_bytes(&mut raw);
        let token = hex::encode(raw);

        let ttl = Duration::hours(self.business.session_ttl_hours as i64);
        self.sessions
            .insert(&token_digest(&token), user_id, Utc::now() + ttl)
            .await?;

        Ok(token)
    }
}

/// SHA-256 hex digest of a session token.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut HashOsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            AppError::new(crate::error::AppErrorKind::Infrastructure(
                crate::error::InfrastructureError::Configuration {
                    message: format!("password hashing failed: {}", e),
                },
            ))
        })
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
