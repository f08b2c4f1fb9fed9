//! # Order Math
//!
//! Pure calculations over checkout line items: validation, totals, and the
//! description string sent to the payment gateway.
//!
//! ## Snapshot Pattern
//! An [`OrderItem`] carries the unit price the caller saw at checkout time.
//! The price is persisted with the line item and never re-read from the live
//! catalog, so later catalog edits cannot rewrite purchase history.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::{ORDER_DESCRIPTION_MAX, ORDER_DESCRIPTION_TRUNCATE_AT};

/// One distinct product in a checkout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalog product id (the catalog itself lives outside this engine).
    pub product_id: i64,

    /// Units ordered; must be positive.
    pub quantity: i64,

    /// Price per unit at checkout time, in minor units.
    pub unit_price: Money,
}

impl OrderItem {
    pub fn new(product_id: i64, quantity: i64, unit_price: impl Into<Money>) -> Self {
        OrderItem {
            product_id,
            quantity,
            unit_price: unit_price.into(),
        }
    }

    /// Line total: unit price × quantity, checked.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// Validates a checkout's line items before anything is written.
///
/// ## Rules
/// - at least one item
/// - positive quantities
/// - non-negative unit prices (zero is allowed for giveaway items)
/// - each product listed at most once
pub fn validate_order(items: &[OrderItem]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }

    for (idx, item) in items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity {
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }
        if item.unit_price.amount() < 0 {
            return Err(ValidationError::NegativeUnitPrice {
                product_id: item.product_id,
                unit_price: item.unit_price.amount(),
            });
        }
        if items[..idx].iter().any(|p| p.product_id == item.product_id) {
            return Err(ValidationError::DuplicateProduct {
                product_id: item.product_id,
            });
        }
    }

    Ok(())
}

/// Total charge for the order: Σ unit price × quantity.
pub fn order_total(items: &[OrderItem]) -> Result<Money, ValidationError> {
    let mut total = Money::zero();
    for item in items {
        let line = item.line_total().ok_or(ValidationError::TotalOverflow)?;
        total = total
            .checked_add(line)
            .ok_or(ValidationError::TotalOverflow)?;
    }
    Ok(total)
}

/// Builds the human-readable item description included in the gateway
/// request.
///
/// The provider caps descriptions at [`ORDER_DESCRIPTION_MAX`] characters;
/// anything longer is cut to [`ORDER_DESCRIPTION_TRUNCATE_AT`] characters
/// with an ellipsis marker appended. Counting is in characters, not bytes:
/// item names upstream are frequently multi-byte.
pub fn order_description(items: &[OrderItem]) -> String {
    let full = items
        .iter()
        .map(|item| format!("product {} x{}", item.product_id, item.quantity))
        .collect::<Vec<_>>()
        .join(", ");

    truncate_description(&full)
}

/// Applies the gateway length cap to an arbitrary description string.
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= ORDER_DESCRIPTION_MAX {
        return description.to_string();
    }

    let mut cut: String = description
        .chars()
        .take(ORDER_DESCRIPTION_TRUNCATE_AT)
        .collect();
    cut.push_str("...");
    cut
}
