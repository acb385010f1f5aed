//! Comprehensive error handling for the Datawave backend
//!
//! This module provides a unified error system with proper HTTP status mapping,
//! user-friendly messages, and structured error codes for client handling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error codes for programmatic client handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Domain errors (4xx)
    #[serde(rename = "INVALID_PLAN")]
    InvalidPlan,
    #[serde(rename = "INSUFFICIENT_FUNDS")]
    InsufficientFunds,
    #[serde(rename = "VERIFICATION_FAILED")]
    VerificationFailed,
    #[serde(rename = "DUPLICATE_REFERENCE")]
    DuplicateReference,
    #[serde(rename = "SLUG_TAKEN")]
    SlugTaken,
    #[serde(rename = "ORDER_NOT_FOUND")]
    OrderNotFound,
    #[serde(rename = "USER_NOT_FOUND")]
    UserNotFound,
    #[serde(rename = "SHOP_NOT_FOUND")]
    ShopNotFound,
    #[serde(rename = "WITHDRAWAL_NOT_FOUND")]
    WithdrawalNotFound,
    #[serde(rename = "TICKET_NOT_FOUND")]
    TicketNotFound,
    #[serde(rename = "INVALID_TRANSITION")]
    InvalidTransition,
    #[serde(rename = "USER_EXISTS")]
    UserExists,
    #[serde(rename = "INVALID_CREDENTIALS")]
    InvalidCredentials,
    #[serde(rename = "UNAUTHORIZED")]
    Unauthorized,
    #[serde(rename = "FORBIDDEN")]
    Forbidden,

    // Infrastructure errors (5xx)
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,

    // External errors (502, 429, 504)
    #[serde(rename = "PAYMENT_PROVIDER_ERROR")]
    PaymentProviderError,
    #[serde(rename = "DELIVERY_PROVIDER_ERROR")]
    DeliveryProviderError,
    #[serde(rename = "RATE_LIMIT_ERROR")]
    RateLimitError,
    #[serde(rename = "EXTERNAL_SERVICE_TIMEOUT")]
    ExternalServiceTimeout,

    // Generic
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
}

/// Which per-user balance an operation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletKind {
    /// Main wallet, spent on purchases
    Main,
    /// Commission payout wallet, spent on withdrawals
    Payout,
}

impl WalletKind {
    pub fn label(&self) -> &'static str {
        match self {
            WalletKind::Main => "wallet",
            WalletKind::Payout => "payout",
        }
    }
}

/// Domain-specific business logic errors
#[derive(Debug, Clone)]
pub enum DomainError {
    /// No plan matches the requested network/plan combination
    InvalidPlan { network: String, plan_id: String },
    /// Balance too low for the requested debit (amounts in minor units)
    InsufficientFunds {
        wallet: WalletKind,
        available: i64,
        required: i64,
    },
    /// Withdrawal request below the configured minimum (minor units)
    WithdrawalBelowMinimum { minimum: i64, requested: i64 },
    /// Payment could not be confirmed or the amount fell short
    VerificationFailed { reference: String, reason: String },
    /// A funds-affecting record already exists for this reference
    DuplicateReference { reference: String },
    /// Another shop already owns the requested slug
    SlugTaken { slug: String },
    /// Order with the given id doesn't exist
    OrderNotFound { order_id: String },
    /// User doesn't exist in the system
    UserNotFound { user_id: String },
    /// No shop registered under the given slug
    ShopNotFound { slug: String },
    /// Withdrawal with the given id doesn't exist
    WithdrawalNotFound { withdrawal_id: String },
    /// Support ticket with the given id doesn't exist
    TicketNotFound { ticket_id: String },
    /// Order status change not allowed by the state machine
    InvalidTransition { from: String, to: String },
    /// Signup collided with an existing username or email
    UserAlreadyExists,
    /// Login failed; deliberately does not say which part was wrong
    InvalidCredentials,
    /// No valid session for a route that requires one
    Unauthorized { reason: String },
    /// Session is valid but the role/ownership check failed
    Forbidden { required: String },
}

/// Infrastructure-level errors (database, configuration)
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    /// Database connection or query failure
    Database { message: String, is_retryable: bool },
    /// Missing or invalid configuration
    Configuration { message: String },
}

/// External service errors (payment verifier, delivery provider)
#[derive(Debug, Clone)]
pub enum ExternalError {
    /// Payment verifier (Paystack) transport or API error
    PaymentProvider {
        provider: String,
        message: String,
        is_retryable: bool,
    },
    /// Delivery provider declined or could not be reached; the message
    /// carries the classified reason and is shown to the caller
    DeliveryProvider {
        provider: String,
        message: String,
        is_retryable: bool,
    },
    /// Rate limit exceeded
    RateLimit {
        service: String,
        retry_after: Option<u64>,
    },
    /// External service timeout
    Timeout { service: String, timeout_secs: u64 },
}

/// Input validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Required field missing
    MissingField { field: String },
    /// Field present but malformed
    InvalidField { field: String, reason: String },
    /// Invalid amount (format or value)
    InvalidAmount { amount: String, reason: String },
    /// Recipient phone number is not a valid Ghanaian mobile number
    InvalidPhoneNumber { phone: String, reason: String },
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Infrastructure(InfrastructureError),
    External(ExternalError),
    Validation(ValidationError),
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
        }
    }

    pub fn domain(err: DomainError) -> Self {
        Self::new(AppErrorKind::Domain(err))
    }

    pub fn validation(err: ValidationError) -> Self {
        Self::new(AppErrorKind::Validation(err))
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::InvalidPlan { .. } => 422,
                DomainError::InsufficientFunds { .. } => 422, // Unprocessable Entity
                DomainError::WithdrawalBelowMinimum { .. } => 422,
                DomainError::VerificationFailed { .. } => 400,
                DomainError::DuplicateReference { .. } => 409, // Conflict
                DomainError::SlugTaken { .. } => 409,
                DomainError::OrderNotFound { .. } => 404,
                DomainError::UserNotFound { .. } => 404,
                DomainError::ShopNotFound { .. } => 404,
                DomainError::WithdrawalNotFound { .. } => 404,
                DomainError::TicketNotFound { .. } => 404,
                DomainError::InvalidTransition { .. } => 409,
                DomainError::UserAlreadyExists => 409,
                DomainError::InvalidCredentials => 401,
                DomainError::Unauthorized { .. } => 401,
                DomainError::Forbidden { .. } => 403,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => 500,
                InfrastructureError::Configuration { .. } => 500,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider { .. } => 502, // Bad Gateway
                ExternalError::DeliveryProvider { .. } => 502,
                ExternalError::RateLimit { .. } => 429, // Too Many Requests
                ExternalError::Timeout { .. } => 504,   // Gateway Timeout
            },
            AppErrorKind::Validation(_) => 400,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::InvalidPlan { .. } => ErrorCode::InvalidPlan,
                DomainError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
                DomainError::WithdrawalBelowMinimum { .. } => ErrorCode::InsufficientFunds,
                DomainError::VerificationFailed { .. } => ErrorCode::VerificationFailed,
                DomainError::DuplicateReference { .. } => ErrorCode::DuplicateReference,
                DomainError::SlugTaken { .. } => ErrorCode::SlugTaken,
                DomainError::OrderNotFound { .. } => ErrorCode::OrderNotFound,
                DomainError::UserNotFound { .. } => ErrorCode::UserNotFound,
                DomainError::ShopNotFound { .. } => ErrorCode::ShopNotFound,
                DomainError::WithdrawalNotFound { .. } => ErrorCode::WithdrawalNotFound,
                DomainError::TicketNotFound { .. } => ErrorCode::TicketNotFound,
                DomainError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
                DomainError::UserAlreadyExists => ErrorCode::UserExists,
                DomainError::InvalidCredentials => ErrorCode::InvalidCredentials,
                DomainError::Unauthorized { .. } => ErrorCode::Unauthorized,
                DomainError::Forbidden { .. } => ErrorCode::Forbidden,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => ErrorCode::DatabaseError,
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider { .. } => ErrorCode::PaymentProviderError,
                ExternalError::DeliveryProvider { .. } => ErrorCode::DeliveryProviderError,
                ExternalError::RateLimit { .. } => ErrorCode::RateLimitError,
                ExternalError::Timeout { .. } => ErrorCode::ExternalServiceTimeout,
            },
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::InvalidPlan { network, plan_id } => {
                    format!("Invalid plan: no '{}' bundle on {}", plan_id, network)
                }
                DomainError::InsufficientFunds {
                    wallet,
                    available,
                    required,
                } => {
                    format!(
                        "Insufficient {} balance. Available: {}, Required: {}",
                        wallet.label(),
                        available,
                        required
                    )
                }
                DomainError::WithdrawalBelowMinimum { minimum, requested } => {
                    format!(
                        "Withdrawal amount {} is below the minimum of {} (minor units)",
                        requested, minimum
                    )
                }
                DomainError::VerificationFailed { reference, reason } => {
                    format!(
                        "Payment verification failed for '{}': {}",
                        reference, reason
                    )
                }
                DomainError::DuplicateReference { reference } => {
                    format!("Transaction '{}' already processed", reference)
                }
                DomainError::SlugTaken { slug } => {
                    format!("Shop ID '{}' is already taken", slug)
                }
                DomainError::OrderNotFound { order_id } => {
                    format!("Order '{}' not found", order_id)
                }
                DomainError::UserNotFound { user_id } => {
                    format!("User '{}' not found", user_id)
                }
                DomainError::ShopNotFound { slug } => {
                    format!("Shop '{}' not found", slug)
                }
                DomainError::WithdrawalNotFound { withdrawal_id } => {
                    format!("Withdrawal '{}' not found", withdrawal_id)
                }
                DomainError::TicketNotFound { ticket_id } => {
                    format!("Support ticket '{}' not found", ticket_id)
                }
                DomainError::InvalidTransition { from, to } => {
                    format!("Order status cannot change from {} to {}", from, to)
                }
                DomainError::UserAlreadyExists => "User already exists".to_string(),
                DomainError::InvalidCredentials => "Invalid credentials".to_string(),
                DomainError::Unauthorized { reason } => {
                    format!("Login required: {}", reason)
                }
                DomainError::Forbidden { required } => {
                    format!("{} access required", required)
                }
            },
            AppErrorKind::Infrastructure(_) => {
                "Service temporarily unavailable. Please try again later".to_string()
            }
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider {
                    provider,
                    is_retryable,
                    ..
                } => {
                    if *is_retryable {
                        format!(
                            "Payment provider ({}) is temporarily unavailable. Please try again",
                            provider
                        )
                    } else {
                        "Payment processing failed. Please contact support".to_string()
                    }
                }
                ExternalError::DeliveryProvider { message, .. } => message.clone(),
                ExternalError::RateLimit {
                    service,
                    retry_after,
                } => {
                    if let Some(secs) = retry_after {
                        format!(
                            "Rate limit exceeded for {}. Please try again in {} seconds",
                            service, secs
                        )
                    } else {
                        format!("Rate limit exceeded for {}. Please try again later", service)
                    }
                }
                ExternalError::Timeout {
                    service,
                    timeout_secs,
                } => {
                    format!(
                        "{} request timed out after {} seconds. Please try again",
                        service, timeout_secs
                    )
                }
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::MissingField { field } => {
                    format!("Required field '{}' is missing", field)
                }
                ValidationError::InvalidField { field, reason } => {
                    format!("Invalid value for '{}': {}", field, reason)
                }
                ValidationError::InvalidAmount { amount, reason } => {
                    format!("Invalid amount '{}': {}", amount, reason)
                }
                ValidationError::InvalidPhoneNumber { phone, reason } => {
                    format!("Invalid phone number '{}': {}", phone, reason)
                }
            },
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Domain(_) => false,
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { is_retryable, .. } => *is_retryable,
                InfrastructureError::Configuration { .. } => false,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider { is_retryable, .. } => *is_retryable,
                ExternalError::DeliveryProvider { is_retryable, .. } => *is_retryable,
                ExternalError::RateLimit { .. } => true,
                ExternalError::Timeout { .. } => true,
            },
            AppErrorKind::Validation(_) => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for AppError {}

// Conversions from specific error types
// Note: From<DatabaseError> lives in database/error.rs, From<PaymentError> in
// payments/error.rs and From<DeliveryError> in delivery/error.rs to keep each
// module's mapping next to the errors it defines.

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;
