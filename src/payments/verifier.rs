use crate::payments::error::PaymentResult;
use async_trait::async_trait;

/// Final state of a gateway transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Success,
    Pending,
    Failed,
    Abandoned,
    Unknown,
}

impl PaymentStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentStatus::Success)
    }
}

/// What the gateway confirms about a transaction reference
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub reference: String,
    pub status: PaymentStatus,
    /// Amount actually paid, in minor units (pesewas)
    pub amount_minor: i64,
    pub currency: String,
    pub channel: Option<String>,
    pub paid_at: Option<String>,
}

impl VerifiedPayment {
    /// Whether the payment succeeded and covers at least `minor` pesewas
    pub fn covers(&self, minor: i64) -> bool {
        self.status.is_success() && self.amount_minor >= minor
    }
}

/// External payment verifier contract. Production talks to Paystack;
/// tests substitute a canned verifier.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify(&self, reference: &str) -> PaymentResult<VerifiedPayment>;
}
