//! Payment verification.
//!
//! The platform never initiates charges itself: the storefront collects
//! payment through the gateway's checkout, and the backend only ever
//! confirms a transaction reference before releasing value (wallet
//! credit, agent upgrade, guest purchase).

pub mod error;
pub mod paystack;
pub mod utils;
pub mod verifier;

pub use error::{PaymentError, PaymentResult};
pub use paystack::{PaystackConfig, PaystackVerifier};
pub use verifier::{PaymentStatus, PaymentVerifier, VerifiedPayment};
