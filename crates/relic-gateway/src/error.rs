//! Gateway error types.
//!
//! Every variant means the same thing to the fulfillment flow: the payment
//! cannot currently be completed, so the enclosing transaction must roll
//! back. The variants exist for logging and for the caller's retry
//! decision, not for divergent control flow.

use thiserror::Error;

/// Failures talking to the payment provider.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure: connection refused, TLS, or the request
    /// timeout configured in [`crate::GatewayConfig`]. A timeout is
    /// deliberately indistinguishable from any other transport failure.
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success result code.
    #[error("gateway rejected the request: {code}: {message}")]
    Rejected { code: String, message: String },

    /// The provider reported success but returned no payable artifact URL.
    /// Treated exactly like a rejection: without a URL the user has no way
    /// to pay, so nothing may persist.
    #[error("gateway response carried no payable artifact url")]
    MissingPayableUrl,

    /// The response body did not match the expected shape.
    #[error("gateway response could not be interpreted: {0}")]
    InvalidResponse(String),
}
