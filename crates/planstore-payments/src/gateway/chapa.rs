//! Chapa Gateway Client
//!
//! Speaks Chapa's hosted-checkout REST API: initialize a transaction to
//! obtain a checkout URL, then verify it by merchant reference. Responses
//! are parsed into explicit schemas; anything off-shape surfaces as a
//! gateway error instead of leaking through.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::PaymentGateway;
use crate::error::{PaymentError, Result};
use crate::types::{CheckoutSession, PaymentRequest, TransactionStatus, VerifiedTransaction};

const DEFAULT_BASE_URL: &str = "https://api.chapa.co";
const DEFAULT_CURRENCY: &str = "ETB";

/// Pause before the single retry of an unreachable gateway
const RETRY_BACKOFF: Duration = Duration::from_millis(300);

/// Chapa API configuration
#[derive(Clone, Debug)]
pub struct ChapaConfig {
    /// Secret API key, sent as a Bearer token
    pub secret_key: String,

    /// API base URL
    pub base_url: String,

    /// Charge currency
    pub currency: String,

    /// Server-to-server notification URL
    pub callback_url: Option<String>,

    /// Where the hosted page sends the customer after payment
    pub return_url: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

impl ChapaConfig {
    /// Create a config with defaults for everything but the key
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            currency: DEFAULT_CURRENCY.into(),
            callback_url: None,
            return_url: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("CHAPA_SECRET_KEY")
            .map_err(|_| PaymentError::Config("CHAPA_SECRET_KEY not set".into()))?;

        let mut config = Self::new(secret_key);
        if let Ok(base_url) = std::env::var("CHAPA_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(currency) = std::env::var("CHAPA_CURRENCY") {
            config.currency = currency;
        }
        Ok(config)
    }

    /// Set the customer return URL
    pub fn with_return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = Some(url.into());
        self
    }

    /// Set the webhook callback URL
    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }
}

/// Chapa client over HTTP
pub struct ChapaGateway {
    config: ChapaConfig,
    client: reqwest::Client,
}

impl ChapaGateway {
    /// Create a client for the given configuration
    pub fn new(config: ChapaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ChapaConfig::from_env()?)
    }

    /// Send a request, retrying once after a short backoff when the
    /// gateway cannot be reached at all. Rejections are never retried.
    async fn send_with_retry<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        match build().send().await {
            Ok(response) => Ok(response),
            Err(first) => {
                tracing::warn!(error = %first, "gateway request failed, retrying once");
                tokio::time::sleep(RETRY_BACKOFF).await;
                build()
                    .send()
                    .await
                    .map_err(|e| PaymentError::GatewayUnavailable(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for ChapaGateway {
    async fn initialize(
        &self,
        request: &PaymentRequest,
        tx_ref: &str,
    ) -> Result<CheckoutSession> {
        let body = InitializeBody {
            amount: request.amount.to_string(),
            currency: self.config.currency.clone(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            tx_ref: tx_ref.to_string(),
            callback_url: self.config.callback_url.clone(),
            return_url: self.config.return_url.clone(),
        };

        let url = format!("{}/v1/transaction/initialize", self.config.base_url);
        let response = self
            .send_with_retry(|| {
                self.client
                    .post(&url)
                    .bearer_auth(&self.config.secret_key)
                    .json(&body)
            })
            .await?;

        let (http_status, reply): (StatusCode, InitializeResponse) = read_json(response).await?;

        if !http_status.is_success() || reply.status.as_deref() != Some("success") {
            let message = gateway_message(reply.message, "Payment initialization failed");
            tracing::warn!(tx_ref, status = %http_status, "gateway rejected initialize");
            return Err(PaymentError::GatewayRejected(message));
        }

        let checkout_url = reply
            .data
            .and_then(|d| d.checkout_url)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                PaymentError::GatewayRejected("Gateway returned no checkout URL".into())
            })?;

        tracing::info!(tx_ref, "checkout session created");

        Ok(CheckoutSession {
            tx_ref: tx_ref.to_string(),
            checkout_url,
        })
    }

    async fn verify(&self, tx_ref: &str) -> Result<VerifiedTransaction> {
        let url = format!("{}/v1/transaction/verify/{}", self.config.base_url, tx_ref);
        let response = self
            .send_with_retry(|| self.client.get(&url).bearer_auth(&self.config.secret_key))
            .await?;

        let (http_status, reply): (StatusCode, VerifyResponse) = read_json(response).await?;

        if http_status == StatusCode::NOT_FOUND {
            return Err(PaymentError::NotFound(tx_ref.to_string()));
        }
        if !http_status.is_success() || reply.status.as_deref() != Some("success") {
            let message = gateway_message(reply.message, "Payment verification failed");
            if message.to_lowercase().contains("not found") {
                return Err(PaymentError::NotFound(tx_ref.to_string()));
            }
            return Err(PaymentError::GatewayRejected(message));
        }

        let raw = reply.data.unwrap_or(serde_json::Value::Null);
        let data: VerifyData = serde_json::from_value(raw.clone()).map_err(|_| {
            PaymentError::GatewayRejected("Unexpected verification response from gateway".into())
        })?;

        let status = data
            .status
            .as_deref()
            .map_or(TransactionStatus::Failed, TransactionStatus::from_gateway);

        Ok(VerifiedTransaction {
            tx_ref: tx_ref.to_string(),
            status,
            amount: data.amount,
            currency: data.currency,
            email: data.email,
            raw,
        })
    }

    fn name(&self) -> &str {
        "chapa"
    }
}

/// Read a response body as JSON, keeping the HTTP status alongside it
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<(StatusCode, T)> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| PaymentError::GatewayUnavailable(e.to_string()))?;

    let parsed = serde_json::from_str(&text).map_err(|_| {
        PaymentError::GatewayRejected(format!(
            "Unexpected gateway response ({status}): {}",
            snippet(&text)
        ))
    })?;

    Ok((status, parsed))
}

/// First 200 characters, for error reporting
fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}

/// Chapa reports validation failures as an object of field messages, so
/// `message` is kept loose and stringified here.
fn gateway_message(message: Option<serde_json::Value>, fallback: &str) -> String {
    match message {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(other) if !other.is_null() => other.to_string(),
        _ => fallback.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct InitializeBody {
    amount: String,
    currency: String,
    email: String,
    first_name: String,
    last_name: String,
    tx_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_url: Option<String>,
}

/// Response shape for `/v1/transaction/initialize`
#[derive(Debug, Deserialize)]
struct InitializeResponse {
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<InitializeData>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    #[serde(default)]
    checkout_url: Option<String>,
}

/// Response shape for `/v1/transaction/verify/{tx_ref}`
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct VerifyData {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    amount: Option<rust_decimal::Decimal>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ChapaConfig::new("csk_test");
        assert_eq!(config.base_url, "https://api.chapa.co");
        assert_eq!(config.currency, "ETB");
        assert!(config.callback_url.is_none());
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_builders() {
        let config = ChapaConfig::new("csk_test")
            .with_return_url("https://shop.example/close-webview")
            .with_callback_url("https://shop.example/api/webhook/chapa");
        assert_eq!(
            config.return_url.as_deref(),
            Some("https://shop.example/close-webview")
        );
        assert_eq!(
            config.callback_url.as_deref(),
            Some("https://shop.example/api/webhook/chapa")
        );
    }

    #[test]
    fn test_initialize_body_omits_unset_urls() {
        let body = InitializeBody {
            amount: "25000".into(),
            currency: "ETB".into(),
            email: "a@b.com".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            tx_ref: "ps-1".into(),
            callback_url: None,
            return_url: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["amount"], "25000");
        assert!(value.get("callback_url").is_none());
        assert!(value.get("return_url").is_none());
    }

    #[test]
    fn test_initialize_response_parses() {
        let raw = r#"{
            "message": "Hosted Link",
            "status": "success",
            "data": { "checkout_url": "https://checkout.chapa.co/checkout/payment/abc" }
        }"#;
        let reply: InitializeResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(reply.status.as_deref(), Some("success"));
        assert_eq!(
            reply.data.unwrap().checkout_url.as_deref(),
            Some("https://checkout.chapa.co/checkout/payment/abc")
        );
    }

    #[test]
    fn test_field_error_message_stringified() {
        let raw = r#"{
            "message": { "email": ["email is invalid"] },
            "status": "failed",
            "data": null
        }"#;
        let reply: InitializeResponse = serde_json::from_str(raw).unwrap();
        let message = gateway_message(reply.message, "Payment initialization failed");
        assert!(message.contains("email is invalid"));
    }

    #[test]
    fn test_gateway_message_fallback() {
        assert_eq!(gateway_message(None, "fallback"), "fallback");
        assert_eq!(
            gateway_message(Some(serde_json::Value::Null), "fallback"),
            "fallback"
        );
        assert_eq!(
            gateway_message(Some(serde_json::json!("declined")), "fallback"),
            "declined"
        );
    }

    #[test]
    fn test_verify_data_accepts_numeric_and_string_amounts() {
        let numeric: VerifyData =
            serde_json::from_value(serde_json::json!({ "status": "success", "amount": 25000 }))
                .unwrap();
        assert_eq!(numeric.amount.map(|a| a.to_string()).as_deref(), Some("25000"));

        let stringy: VerifyData =
            serde_json::from_value(serde_json::json!({ "status": "success", "amount": "25000" }))
                .unwrap();
        assert_eq!(stringy.amount.map(|a| a.to_string()).as_deref(), Some("25000"));
    }

    #[test]
    fn test_snippet_survives_multibyte_text() {
        let text = "ብር".repeat(300);
        assert_eq!(snippet(&text).chars().count(), 200);
    }
}
