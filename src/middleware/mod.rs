//! HTTP middleware: auth extractors, error formatting, request logging

pub mod auth;
pub mod error;
pub mod logging;

pub use auth::{AdminUser, CurrentUser, MaybeUser};
pub use error::ErrorResponse;
pub use logging::{request_logging_middleware, UuidRequestId};
