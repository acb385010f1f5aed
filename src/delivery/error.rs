use thiserror::Error;

pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Classified delivery failures. The messages are shown to the buyer
/// verbatim, so they stay in storefront language.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// Provider served an HTML/anti-bot page instead of JSON
    #[error("Provider Blocked Connection (Anti-Bot). Contact Provider Support.")]
    Blocked,

    /// Provider rejected our credentials or IP (HTTP 403)
    #[error("Provider Access Denied (403). Contact Admin.")]
    AccessDenied,

    /// Transport failure or timeout before a usable response
    #[error("Provider Connection Failed")]
    ConnectionFailed { message: String },

    /// Well-formed decline from the provider's order API
    #[error("Provider Error: {message}")]
    BusinessRejected { message: String },
}

impl DeliveryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeliveryError::ConnectionFailed { .. })
    }
}

impl From<DeliveryError> for crate::error::AppError {
    fn from(err: DeliveryError) -> Self {
        use crate::error::{AppError, AppErrorKind, ExternalError};

        let is_retryable = err.is_retryable();
        AppError::new(AppErrorKind::External(ExternalError::DeliveryProvider {
            provider: "datapacks".to_string(),
            message: err.to_string(),
            is_retryable,
        }))
    }
}
