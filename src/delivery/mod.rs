//! Data bundle delivery.
//!
//! One external collaborator actually pushes data to a phone. The trait
//! keeps the purchase flow testable; the production client talks to the
//! Datapacks order API.

pub mod datapacks;
pub mod error;

pub use datapacks::{DatapacksClient, DatapacksConfig};
pub use error::{DeliveryError, DeliveryResult};

use crate::pricing::Network;
use async_trait::async_trait;

/// One delivery attempt
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub network: Network,
    /// Bundle size in GB, parsed from the plan id
    pub capacity: u32,
    /// Recipient phone number
    pub recipient: String,
    /// Our order reference, passed through for provider-side tracing
    pub client_ref: String,
}

/// Successful delivery. The provider's own reference replaces ours on
/// the order when present.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub external_ref: Option<String>,
}

/// External delivery provider contract. A failure is a classified
/// `DeliveryError`; the purchase flow refunds on any of them.
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    async fn deliver(&self, request: &DeliveryRequest) -> DeliveryResult<DeliveryReceipt>;
}
