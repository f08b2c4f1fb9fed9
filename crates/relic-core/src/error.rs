//! # Error Types
//!
//! Domain-specific error types for relic-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  relic-core errors (this file)                                          │
//! │  ├── ValidationError  - Order input validation failures                 │
//! │  └── StatusError      - Rejected shipment status transitions            │
//! │                                                                         │
//! │  relic-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  relic-commerce errors (per operation)                                  │
//! │  ├── FulfillmentError - fulfill_order                                   │
//! │  ├── AllocationError  - enter_lottery                                   │
//! │  ├── BidError         - place_bid                                       │
//! │  └── ShipmentUpdateError - update_shipment_status                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, status names, etc.)
//! 3. Errors are enum variants, never String
//! 4. The core never contains presentation text; callers map these to
//!    whatever the surrounding application shows users

use thiserror::Error;

use crate::status::ShipmentStatus;

// =============================================================================
// Validation Error
// =============================================================================

/// Order input validation errors.
///
/// Checked before any row is written, so a rejected order leaves no trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A checkout with no line items is meaningless.
    #[error("order contains no items")]
    EmptyOrder,

    /// Quantity must be at least 1.
    #[error("product {product_id}: quantity must be positive, got {quantity}")]
    NonPositiveQuantity { product_id: i64, quantity: i64 },

    /// Snapshotted unit price may be zero (giveaways) but never negative.
    #[error("product {product_id}: unit price must not be negative, got {unit_price}")]
    NegativeUnitPrice { product_id: i64, unit_price: i64 },

    /// A checkout may list each product at most once; quantities aggregate
    /// within one line item.
    #[error("product {product_id} appears more than once in the order")]
    DuplicateProduct { product_id: i64 },

    /// Order total overflowed i64. Practically unreachable, but the money
    /// math is checked and the failure has to go somewhere.
    #[error("order total overflow")]
    TotalOverflow,

    /// The caller-supplied merchant payment identifier is empty.
    #[error("merchant payment id must not be empty")]
    EmptyMerchantPaymentId,
}

// =============================================================================
// Status Error
// =============================================================================

/// Rejected shipment status transitions.
///
/// ## When This Occurs
/// - Skipping a step (`processing → delivered`)
/// - Leaving a terminal state (`delivered → shipped`)
/// - Re-applying the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatusError {
    /// The requested transition is not in the allowed set.
    #[error("cannot transition shipment from {from} to {to}")]
    InvalidTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    /// `delivered`, `cancelled` and `payment_failed` accept no further
    /// transitions, whatever the target.
    #[error("shipment is already {current}, which is terminal")]
    Terminal { current: ShipmentStatus },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_messages() {
        let err = ValidationError::NonPositiveQuantity {
            product_id: 7,
            quantity: 0,
        };
        assert_eq!(
            err.to_string(),
            "product 7: quantity must be positive, got 0"
        );
    }

    #[test]
    fn status_error_messages() {
        let err = StatusError::InvalidTransition {
            from: ShipmentStatus::Processing,
            to: ShipmentStatus::Delivered,
        };
        assert_eq!(
            err.to_string(),
            "cannot transition shipment from processing to delivered"
        );
    }
}
