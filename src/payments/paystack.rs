//! Paystack transaction verification client.
//!
//! `GET {base}/transaction/verify/{reference}` with the secret key as a
//! bearer token. The envelope is `{ status, message, data }` where the
//! outer `status` reports whether the API call itself succeeded and
//! `data.status` carries the transaction state.

use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::utils::PaymentHttpClient;
use crate::payments::verifier::{PaymentStatus, PaymentVerifier, VerifiedPayment};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl PaystackConfig {
    /// Load from environment. The secret key has no default: startup
    /// fails without it.
    pub fn from_env() -> PaymentResult<Self> {
        let secret_key =
            std::env::var("PAYSTACK_SECRET_KEY").map_err(|_| PaymentError::ValidationError {
                message: "PAYSTACK_SECRET_KEY environment variable is required".to_string(),
                field: Some("PAYSTACK_SECRET_KEY".to_string()),
            })?;

        Ok(Self {
            base_url: std::env::var("PAYSTACK_BASE_URL")
                .unwrap_or_else(|_| "https://api.paystack.co".to_string()),
            timeout_secs: std::env::var("PAYSTACK_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            max_retries: std::env::var("PAYSTACK_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(3),
            secret_key,
        })
    }
}

pub struct PaystackVerifier {
    config: PaystackConfig,
    http: PaymentHttpClient,
}

impl PaystackVerifier {
    pub fn new(config: PaystackConfig) -> PaymentResult<Self> {
        let http =
            PaymentHttpClient::new(Duration::from_secs(config.timeout_secs), config.max_retries)?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> PaymentResult<Self> {
        Self::new(PaystackConfig::from_env()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

#[async_trait]
impl PaymentVerifier for PaystackVerifier {
    async fn verify(&self, reference: &str) -> PaymentResult<VerifiedPayment> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(PaymentError::ValidationError {
                message: "transaction reference is required".to_string(),
                field: Some("reference".to_string()),
            });
        }

        let raw: PaystackEnvelope<PaystackVerifyData> = self
            .http
            .request_json(
                reqwest::Method::GET,
                &self.endpoint(&format!("/transaction/verify/{}", reference)),
                Some(&self.config.secret_key),
                None,
            )
            .await?;

        if !raw.status {
            return Err(PaymentError::ProviderError {
                provider: "paystack".to_string(),
                message: raw.message,
                provider_code: None,
                retryable: false,
            });
        }

        let status = parse_transaction_status(&raw.data.status);
        info!(
            reference = %reference,
            status = %raw.data.status,
            amount_minor = raw.data.amount,
            "paystack transaction verified"
        );

        Ok(VerifiedPayment {
            reference: reference.to_string(),
            status,
            amount_minor: raw.data.amount,
            currency: raw.data.currency,
            channel: raw.data.channel,
            paid_at: raw.data.paid_at,
        })
    }
}

fn parse_transaction_status(status: &str) -> PaymentStatus {
    match status {
        "success" => PaymentStatus::Success,
        "pending" => PaymentStatus::Pending,
        "failed" => PaymentStatus::Failed,
        "abandoned" => PaymentStatus::Abandoned,
        _ => PaymentStatus::Unknown,
    }
}

#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    message: String,
    data: T,
}

#[derive(Debug, Deserialize)]
struct PaystackVerifyData {
    amount: i64,
    currency: String,
    status: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    paid_at: Option<String>,
}
