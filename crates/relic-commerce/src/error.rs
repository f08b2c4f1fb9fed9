//! # Operation Error Taxonomy
//!
//! One error enum per caller-facing operation. The surrounding application
//! maps these to user-visible messages; no presentation text lives here.
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  NoShippingAddress    precondition unmet, needs user action             │
//! │  DuplicatePayment /   constraint violation: treat as "already done",    │
//! │  DuplicateEntry /     do not retry                                      │
//! │  DuplicateBid                                                           │
//! │  GatewayRejected      provider declined or unreachable; fully rolled    │
//! │                       back, retry only after confirming the first       │
//! │                       attempt truly failed (same idempotency key!)      │
//! │  *NotFound            referenced entity absent                          │
//! │  Persistence          unexpected database error, logged, never          │
//! │                       partially applied                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `From<DbError>` impls double as the constraint decoder: a UNIQUE
//! violation carries the violated index, and each operation maps the index
//! it races on to its own duplicate variant. Anything else is a
//! `Persistence` failure.

use thiserror::Error;

use relic_core::{Money, StatusError, ValidationError};
use relic_db::DbError;
use relic_gateway::GatewayError;

// =============================================================================
// Fulfillment
// =============================================================================

/// Failures of `fulfill_order` (and `payment_status`).
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The user has no registered shipping address. Not retriable without
    /// user action.
    #[error("user {user_id} has no shipping address")]
    NoShippingAddress { user_id: i64 },

    /// The order items failed validation; nothing was written.
    #[error("invalid order: {0}")]
    InvalidOrder(#[from] ValidationError),

    /// A payment with this merchant payment id already exists. The caller
    /// should treat the checkout as already submitted.
    #[error("merchant payment id was already used")]
    DuplicatePayment,

    /// The gateway declined or was unreachable. All rows were rolled back;
    /// nothing persists for this attempt.
    #[error("payment gateway rejected the checkout: {0}")]
    GatewayRejected(#[source] GatewayError),

    /// No payment with the given merchant payment id exists.
    #[error("payment not found: {merchant_payment_id}")]
    PaymentNotFound { merchant_payment_id: String },

    /// Unexpected database failure.
    #[error("persistence failure: {0}")]
    Persistence(DbError),
}

impl From<DbError> for FulfillmentError {
    fn from(err: DbError) -> Self {
        if err.is_unique_violation_on("paypay_payments.merchant_payment_id") {
            FulfillmentError::DuplicatePayment
        } else {
            FulfillmentError::Persistence(err)
        }
    }
}

// =============================================================================
// Lottery Allocation
// =============================================================================

/// Failures of `enter_lottery`.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// The lottery event does not exist.
    #[error("lottery event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    /// The event is not accepting entries (not active, or outside its
    /// draw window).
    #[error("lottery event {event_id} is not accepting entries")]
    EventClosed { event_id: i64 },

    /// The allocation does not exist, or belongs to a different event.
    #[error("lottery allocation not found: {allocation_id}")]
    AllocationNotFound { allocation_id: i64 },

    /// The allocation already holds as many entries as it has quantity.
    #[error("lottery allocation {allocation_id} is exhausted")]
    AllocationExhausted { allocation_id: i64 },

    /// The user already entered this allocation. Treat as "already done".
    #[error("user already entered this allocation")]
    DuplicateEntry,

    /// Unexpected database failure.
    #[error("persistence failure: {0}")]
    Persistence(DbError),
}

impl From<DbError> for AllocationError {
    fn from(err: DbError) -> Self {
        if err.is_unique_violation_on("lottery_entries") {
            AllocationError::DuplicateEntry
        } else {
            AllocationError::Persistence(err)
        }
    }
}

// =============================================================================
// Sealed Bids
// =============================================================================

/// Failures of `place_bid` and `visible_bids`.
#[derive(Debug, Error)]
pub enum BidError {
    /// The auction does not exist.
    #[error("auction not found: {auction_id}")]
    AuctionNotFound { auction_id: i64 },

    /// The offered amount is below the auction's minimum bid.
    #[error("bid {offered} is below the minimum bid {minimum}")]
    BelowMinimum { minimum: Money, offered: Money },

    /// The user already bid on this auction and it does not allow
    /// retraction.
    #[error("user already bid on this auction")]
    DuplicateBid,

    /// Unexpected database failure.
    #[error("persistence failure: {0}")]
    Persistence(DbError),
}

impl From<DbError> for BidError {
    fn from(err: DbError) -> Self {
        if err.is_unique_violation_on("sealed_bids") {
            BidError::DuplicateBid
        } else {
            BidError::Persistence(err)
        }
    }
}

// =============================================================================
// Shipment Updates
// =============================================================================

/// Failures of `update_shipment_status`.
#[derive(Debug, Error)]
pub enum ShipmentUpdateError {
    /// No shipment with the given id.
    #[error("shipment not found: {shipment_id}")]
    NotFound { shipment_id: String },

    /// The transition is not allowed by the state machine (including any
    /// attempt to leave a terminal state).
    #[error(transparent)]
    Transition(#[from] StatusError),

    /// Unexpected database failure.
    #[error("persistence failure: {0}")]
    Persistence(#[from] DbError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique(constraint: &str) -> DbError {
        DbError::UniqueViolation {
            constraint: constraint.to_string(),
        }
    }

    #[test]
    fn constraint_decoding_per_operation() {
        assert!(matches!(
            FulfillmentError::from(unique("paypay_payments.merchant_payment_id")),
            FulfillmentError::DuplicatePayment
        ));
        assert!(matches!(
            AllocationError::from(unique(
                "lottery_entries.user_id, lottery_entries.lottery_product_id"
            )),
            AllocationError::DuplicateEntry
        ));
        assert!(matches!(
            BidError::from(unique("sealed_bids.auction_id, sealed_bids.user_id")),
            BidError::DuplicateBid
        ));
    }

    #[test]
    fn foreign_constraint_stays_a_persistence_failure() {
        assert!(matches!(
            FulfillmentError::from(unique("lottery_entries.user_id")),
            FulfillmentError::Persistence(_)
        ));
        assert!(matches!(
            AllocationError::from(DbError::QueryFailed("disk".into())),
            AllocationError::Persistence(_)
        ));
    }
}
