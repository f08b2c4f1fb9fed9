//! PayPay HTTP client.
//!
//! Implements [`PaymentGateway`] against the provider's REST API: one POST
//! to mint a payable code, one GET to read a payment back. Every request
//! carries the timeout from [`GatewayConfig`]; fulfillment holds a database
//! transaction open across the POST, so an unbounded request here would be
//! an unbounded lock.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use relic_core::Money;

use crate::error::GatewayError;
use crate::types::{CreateCodeRequest, PayableCode, PaymentDetails};
use crate::PaymentGateway;

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for the provider API.
///
/// Constructed once at startup (see relic-commerce's `StoreConfig`) and
/// handed to [`PayPayClient::new`]; nothing in this crate reads the process
/// environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API origin, e.g. `https://api.paypay.ne.jp` or a sandbox host.
    pub base_url: String,

    /// API key sent as a bearer token.
    pub api_key: String,

    /// Merchant identifier for the assume-merchant header.
    pub merchant_id: String,

    /// ISO 4217 currency for all amounts. Default: JPY.
    pub currency: String,

    /// Per-request timeout. A timeout surfaces as a gateway failure and
    /// rolls the enclosing checkout back. Default: 10 seconds.
    pub request_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        merchant_id: impl Into<String>,
    ) -> Self {
        GatewayConfig {
            base_url: base_url.into(),
            api_key: api_key.into(),
            merchant_id: merchant_id.into(),
            currency: "JPY".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the currency code.
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// =============================================================================
// Wire Format
// =============================================================================
// The provider wraps every response in a result envelope and speaks
// camelCase with epoch-second timestamps. None of these types leave this
// module.

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "resultInfo")]
    result_info: ResultInfo,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    code: String,
    #[serde(default)]
    message: String,
}

const RESULT_SUCCESS: &str = "SUCCESS";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireAmount {
    amount: i64,
    currency: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireOrderItem {
    name: String,
    product_id: String,
    quantity: i64,
    unit_price: WireAmount,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCodeBody {
    merchant_payment_id: String,
    amount: WireAmount,
    code_type: &'static str,
    order_description: String,
    order_items: Vec<WireOrderItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeData {
    url: Option<String>,
    code_id: Option<String>,
    expiry_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentData {
    status: String,
    requested_at: Option<i64>,
    accepted_at: Option<i64>,
    amount: Option<WireAmountIn>,
}

#[derive(Debug, Deserialize)]
struct WireAmountIn {
    amount: i64,
}

fn epoch_to_utc(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

/// Unwraps the result envelope: non-SUCCESS codes become `Rejected`,
/// a missing data section becomes `InvalidResponse`.
fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, GatewayError> {
    if envelope.result_info.code != RESULT_SUCCESS {
        return Err(GatewayError::Rejected {
            code: envelope.result_info.code,
            message: envelope.result_info.message,
        });
    }
    envelope
        .data
        .ok_or_else(|| GatewayError::InvalidResponse("missing data section".to_string()))
}

// =============================================================================
// Client
// =============================================================================

/// [`PaymentGateway`] implementation over the provider's REST API.
#[derive(Debug, Clone)]
pub struct PayPayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl PayPayClient {
    /// Builds the client with the configured request timeout baked into the
    /// underlying connection pool.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(PayPayClient { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentGateway for PayPayClient {
    async fn create_payable_code(
        &self,
        request: CreateCodeRequest,
    ) -> Result<PayableCode, GatewayError> {
        debug!(
            merchant_payment_id = %request.merchant_payment_id,
            amount = %request.amount,
            items = request.order_items.len(),
            "Requesting payable code"
        );

        let body = CreateCodeBody {
            merchant_payment_id: request.merchant_payment_id.clone(),
            amount: WireAmount {
                amount: request.amount.amount(),
                currency: request.currency.clone(),
            },
            code_type: "ORDER_QR",
            order_description: request.order_description,
            order_items: request
                .order_items
                .iter()
                .map(|item| WireOrderItem {
                    name: format!("product {}", item.product_id),
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    unit_price: WireAmount {
                        amount: item.unit_price.amount(),
                        currency: request.currency.clone(),
                    },
                })
                .collect(),
        };

        let response = self
            .http
            .post(self.endpoint("/v2/codes"))
            .bearer_auth(&self.config.api_key)
            .header("X-ASSUME-MERCHANT", &self.config.merchant_id)
            .json(&body)
            .send()
            .await?;

        let envelope: Envelope<CodeData> = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let data = match unwrap_envelope(envelope) {
            Ok(data) => data,
            Err(err) => {
                warn!(
                    merchant_payment_id = %request.merchant_payment_id,
                    error = %err,
                    "Payable code request failed"
                );
                return Err(err);
            }
        };

        // No URL means the user has no way to pay; the checkout must not
        // survive this response.
        let url = match data.url {
            Some(url) if !url.is_empty() => url,
            _ => return Err(GatewayError::MissingPayableUrl),
        };

        Ok(PayableCode {
            url,
            code_id: data.code_id.unwrap_or_default(),
            expires_at: epoch_to_utc(data.expiry_date),
        })
    }

    async fn get_payment_details(
        &self,
        merchant_payment_id: &str,
    ) -> Result<PaymentDetails, GatewayError> {
        debug!(merchant_payment_id = %merchant_payment_id, "Fetching payment details");

        let response = self
            .http
            .get(self.endpoint(&format!("/v2/codes/payments/{merchant_payment_id}")))
            .bearer_auth(&self.config.api_key)
            .header("X-ASSUME-MERCHANT", &self.config.merchant_id)
            .send()
            .await?;

        let envelope: Envelope<PaymentData> = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let data = unwrap_envelope(envelope)?;

        let status = serde_json::from_value(serde_json::Value::String(data.status.clone()))
            .map_err(|_| {
                GatewayError::InvalidResponse(format!("unknown payment status: {}", data.status))
            })?;

        Ok(PaymentDetails {
            status,
            requested_at: epoch_to_utc(data.requested_at),
            accepted_at: epoch_to_utc(data.accepted_at),
            amount: Money::new(data.amount.map(|a| a.amount).unwrap_or(0)),
        })
    }
}
