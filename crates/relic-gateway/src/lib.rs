//! # relic-gateway: Payment Gateway Adapter
//!
//! Narrow adapter over the external payment provider. The storefront needs
//! exactly two things from the provider: turn a checkout into a payable
//! QR/redirect artifact, and report what happened to a payment afterwards.
//! Both are expressed on the [`PaymentGateway`] trait; the HTTP protocol
//! behind them stays inside [`client`].
//!
//! ## Why a trait seam
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  relic-commerce ──► Arc<dyn PaymentGateway> ──┬──► PayPayClient (HTTP)  │
//! │                                               └──► MockGateway (tests)  │
//! │                                                                         │
//! │  Fulfillment holds a database transaction open across the              │
//! │  create_payable_code call. The trait keeps that call injectable so     │
//! │  the rollback path is testable without a network.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod types;

pub use client::{GatewayConfig, PayPayClient};
pub use error::GatewayError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockGateway;
pub use types::{
    CreateCodeRequest, GatewayOrderItem, GatewayPaymentStatus, PayableCode, PaymentDetails,
};

use async_trait::async_trait;

/// The two provider operations this engine consumes.
///
/// Implementations must be `Send + Sync`: services hold them behind an
/// `Arc<dyn PaymentGateway>` and call them from concurrent request units.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payable QR/redirect artifact for a checkout.
    ///
    /// Any failure — provider rejection, missing artifact URL, decode
    /// error, timeout — is a [`GatewayError`]. Callers treat every variant
    /// as "the checkout cannot be paid" and roll back.
    async fn create_payable_code(
        &self,
        request: CreateCodeRequest,
    ) -> Result<PayableCode, GatewayError>;

    /// Fetches the provider-side status and amounts for a payment.
    ///
    /// Payment status is never stored locally; this is the single source
    /// of truth for it.
    async fn get_payment_details(
        &self,
        merchant_payment_id: &str,
    ) -> Result<PaymentDetails, GatewayError>;
}
