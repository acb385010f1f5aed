//! Datapacks order client.
//!
//! The provider fronts its API with anti-bot protection, so the client
//! sends browser-like headers and treats an HTML body as the distinct
//! blocked failure instead of a JSON parse crash. A single GET places
//! the order; there are no retries from the purchase path.

use crate::delivery::error::{DeliveryError, DeliveryResult};
use crate::delivery::{DeliveryProvider, DeliveryReceipt, DeliveryRequest};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct DatapacksConfig {
    pub token: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl DatapacksConfig {
    /// Load from environment. The bearer token has no default: startup
    /// fails without it.
    pub fn from_env() -> DeliveryResult<Self> {
        let token =
            std::env::var("DATAPACKS_TOKEN").map_err(|_| DeliveryError::ConnectionFailed {
                message: "DATAPACKS_TOKEN environment variable is required".to_string(),
            })?;

        Ok(Self {
            base_url: std::env::var("DATAPACKS_BASE_URL")
                .unwrap_or_else(|_| "https://datapacks.shop/api.php".to_string()),
            timeout_secs: std::env::var("DATAPACKS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            token,
        })
    }
}

pub struct DatapacksClient {
    config: DatapacksConfig,
    client: Client,
}

impl DatapacksClient {
    pub fn new(config: DatapacksConfig) -> DeliveryResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeliveryError::ConnectionFailed {
                message: format!("failed to initialize HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> DeliveryResult<Self> {
        Self::new(DatapacksConfig::from_env()?)
    }
}

#[async_trait]
impl DeliveryProvider for DatapacksClient {
    async fn deliver(&self, request: &DeliveryRequest) -> DeliveryResult<DeliveryReceipt> {
        info!(
            network = %request.network,
            capacity_gb = request.capacity,
            recipient = %request.recipient,
            client_ref = %request.client_ref,
            "placing delivery order"
        );

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("action", "order"),
                ("network", request.network.provider_code()),
                ("capacity", &request.capacity.to_string()),
                ("recipient", &request.recipient),
                ("client_ref", &request.client_ref),
            ])
            .bearer_auth(&self.config.token)
            .header("User-Agent", BROWSER_USER_AGENT)
            .header("Referer", "https://datapacks.shop/")
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,\
                 image/avif,image/webp,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                warn!(client_ref = %request.client_ref, error = %e, "delivery request failed");
                DeliveryError::ConnectionFailed {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::ConnectionFailed {
                message: e.to_string(),
            })?;

        classify_response(status, &body)
    }
}

/// Turn a raw provider response into a receipt or a classified failure.
/// Split out of the HTTP path so the anti-bot and decline handling is
/// testable without a network.
fn classify_response(status: StatusCode, body: &str) -> DeliveryResult<DeliveryReceipt> {
    if status == StatusCode::FORBIDDEN {
        return Err(DeliveryError::AccessDenied);
    }
    if status == StatusCode::METHOD_NOT_ALLOWED {
        return Err(DeliveryError::BusinessRejected {
            message: "Method Not Allowed".to_string(),
        });
    }
    if !status.is_success() {
        return Err(DeliveryError::ConnectionFailed {
            message: format!("HTTP {}", status),
        });
    }

    let trimmed = body.trim_start();
    if trimmed.starts_with("<!DOCTYPE html") || trimmed.starts_with("<html") {
        warn!("delivery provider served an anti-bot page");
        return Err(DeliveryError::Blocked);
    }

    // Any other non-JSON body is the same anti-bot interception in a
    // different costume.
    let parsed: DatapacksResponse = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => {
            warn!("delivery provider returned a non-JSON body");
            return Err(DeliveryError::Blocked);
        }
    };

    match parsed.results {
        Some(results) if !results.is_empty() => Ok(DeliveryReceipt {
            external_ref: results.into_iter().next().and_then(|r| r.external_ref),
        }),
        _ => Err(DeliveryError::BusinessRejected {
            message: parsed
                .message
                .unwrap_or_else(|| trimmed.to_string()),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct DatapacksResponse {
    #[serde(default)]
    results: Option<Vec<DatapacksOrderResult>>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatapacksOrderResult {
    #[serde(rename = "ref")]
    #[serde(default)]
    external_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_order_returns_external_ref() {
        let body = r#"{"results":[{"ref":"DP-9981"}]}"#;
        let receipt = classify_response(StatusCode::OK, body).unwrap();
        assert_eq!(receipt.external_ref.as_deref(), Some("DP-9981"));
    }

    #[test]
    fn test_html_body_is_blocked_not_a_parse_error() {
        let body = "<!DOCTYPE html>\n<html><body>Checking your browser</body></html>";
        let err = classify_response(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, DeliveryError::Blocked));
    }

    #[test]
    fn test_non_json_body_is_blocked() {
        let err = classify_response(StatusCode::OK, "maintenance in progress").unwrap_err();
        assert!(matches!(err, DeliveryError::Blocked));
    }

    #[test]
    fn test_forbidden_is_access_denied() {
        let err = classify_response(StatusCode::FORBIDDEN, "").unwrap_err();
        assert!(matches!(err, DeliveryError::AccessDenied));
    }

    #[test]
    fn test_empty_results_is_a_business_decline() {
        let body = r#"{"results":[],"message":"Insufficient provider balance"}"#;
        let err = classify_response(StatusCode::OK, body).unwrap_err();
        match err {
            DeliveryError::BusinessRejected { message } => {
                assert_eq!(message, "Insufficient provider balance");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_server_error_is_connection_failed() {
        let err = classify_response(StatusCode::BAD_GATEWAY, "oops").unwrap_err();
        assert!(matches!(err, DeliveryError::ConnectionFailed { .. }));
    }
}
