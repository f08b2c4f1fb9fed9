//! Adapter-level request and response types.
//!
//! These are the shapes the rest of the workspace sees. The provider's
//! actual wire format (field casing, envelope, epoch timestamps) is an
//! implementation detail of [`crate::client`] and never leaks past it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relic_core::Money;

/// Inputs for creating a payable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCodeRequest {
    /// Caller-chosen idempotency key; also the key used later to query
    /// payment details.
    pub merchant_payment_id: String,

    /// Total charge (Σ unit price × quantity), minor units.
    pub amount: Money,

    /// ISO 4217 code, from [`crate::GatewayConfig`].
    pub currency: String,

    /// The ordered items, for the provider-side receipt.
    pub order_items: Vec<GatewayOrderItem>,

    /// Human-readable summary, already truncated to the provider's limit
    /// by relic-core.
    pub order_description: String,
}

/// One line item as the provider wants to see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrderItem {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

/// The payable QR/redirect artifact a user redeems to complete payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayableCode {
    /// Where the user goes to pay. The one field fulfillment cannot do
    /// without.
    pub url: String,

    /// Provider-side identifier of the artifact.
    pub code_id: String,

    /// When the artifact stops being redeemable, if the provider says.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Provider-side lifecycle of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayPaymentStatus {
    Created,
    Authorized,
    Reauthorizing,
    Completed,
    Refunded,
    Failed,
    Canceled,
    Expired,
}

impl GatewayPaymentStatus {
    /// Whether money has actually moved.
    pub const fn is_settled(&self) -> bool {
        matches!(self, GatewayPaymentStatus::Completed)
    }
}

/// Status and amounts for one payment, as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub status: GatewayPaymentStatus,
    pub requested_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub amount: Money,
}
