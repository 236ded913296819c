//! Payment Wire Types
//!
//! Request and response shapes shared by the server and the storefront
//! client, plus the validation that gates the gateway adapter.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

/// One non-whitespace run, an @, another run, a dot, a final run.
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

/// Check an email address against the storefront's pattern
pub fn email_is_valid(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Raw checkout submission as received from the storefront client.
///
/// Every field is optional so that a missing field surfaces as one of our
/// own validation errors instead of a deserializer rejection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSubmission {
    pub amount: Option<Decimal>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub plan: Option<String>,
}

impl PaymentSubmission {
    /// Validate field presence and shape, yielding a request that is safe
    /// to hand to the gateway. The first failing field wins.
    pub fn validate(&self) -> Result<PaymentRequest> {
        let amount = self.amount.ok_or_else(|| PaymentError::Validation {
            field: "amount",
            reason: "A payment amount is required".into(),
        })?;
        if amount <= Decimal::ZERO {
            return Err(PaymentError::Validation {
                field: "amount",
                reason: "Amount must be greater than zero".into(),
            });
        }

        let email = required(&self.email, "email", "An email address is required")?;
        if !email_is_valid(&email) {
            return Err(PaymentError::Validation {
                field: "email",
                reason: "A valid email address is required".into(),
            });
        }

        let first_name = required(&self.first_name, "firstName", "First name is required")?;
        let last_name = required(&self.last_name, "lastName", "Last name is required")?;
        let plan = required(&self.plan, "plan", "A plan selection is required")?;

        Ok(PaymentRequest {
            amount,
            email,
            first_name,
            last_name,
            plan,
        })
    }
}

fn required(value: &Option<String>, field: &'static str, reason: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(PaymentError::Validation {
            field,
            reason: reason.into(),
        }),
    }
}

/// Validated checkout request
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Total charge in major currency units
    pub amount: Decimal,

    /// Customer email
    pub email: String,

    /// Customer first name
    pub first_name: String,

    /// Customer last name
    pub last_name: String,

    /// Free-text plan label chosen on the storefront
    pub plan: String,
}

/// A hosted checkout session minted by the gateway
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Merchant transaction reference
    pub tx_ref: String,

    /// Hosted payment page to present to the customer
    pub checkout_url: String,
}

/// Transaction status as reported by the gateway
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    /// Map a gateway status string. Anything unrecognized reads as failed
    /// rather than pending, so a renamed status can never count as paid.
    pub fn from_gateway(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "success" => TransactionStatus::Success,
            "pending" => TransactionStatus::Pending,
            _ => TransactionStatus::Failed,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
        }
    }

    /// Whether this status means the customer has paid
    pub fn is_paid(self) -> bool {
        matches!(self, TransactionStatus::Success)
    }
}

/// Normalized result of a gateway verification call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifiedTransaction {
    /// Merchant transaction reference
    pub tx_ref: String,

    /// Authoritative status
    pub status: TransactionStatus,

    /// Charged amount, when the gateway reports one
    pub amount: Option<Decimal>,

    /// Charge currency
    pub currency: Option<String>,

    /// Customer email on the charge
    pub email: Option<String>,

    /// Raw gateway payload, for fields the schema does not carry
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// HTTP response envelope shared by every payment endpoint.
///
/// A success carries `data` when the endpoint has a payload; failures
/// carry `error` instead. The webhook acknowledgement is a bare
/// `{"success":true}` with neither.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Successful response carrying a payload
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed response carrying a message
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl Envelope<()> {
    /// Bare acknowledgement, `{"success":true}`
    pub fn accepted() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}
