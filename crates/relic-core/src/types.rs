//! # Domain Types
//!
//! Core domain entities for the storefront engine.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Domain Entities                                │
//! │                                                                         │
//! │  User ──┬── Address (0..1, replaceable)                                 │
//! │         ├── Payment (0..n) ──┬── Shipment (exactly 1)                   │
//! │         │                    └── PurchasedItem (1..n)                   │
//! │         ├── LotteryEntry (0..n) ──► LotteryProduct ──► LotteryEvent     │
//! │         └── SealedBid (0..n) ─────► Auction                             │
//! │                                                                         │
//! │  Payment exclusively owns its Shipment and PurchasedItems.              │
//! │  Entries and bids reference their event/auction by id only.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Convention
//! - Rows this engine creates carry UUID-v4 string ids.
//! - Entities owned by external collaborators (users, catalog products,
//!   lottery events/allocations, auctions) are referenced by `i64` id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::ShipmentStatus;

// =============================================================================
// Address
// =============================================================================

/// A user's shipping address. One per user; registering again replaces the
/// existing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Address {
    pub id: String,
    pub user_id: i64,
    pub country: String,
    pub postal_code: String,
    pub street: String,
    pub recipient_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// The single-line form snapshotted onto a shipment at checkout.
    ///
    /// A change to the address afterwards must not alter historical
    /// shipments, which is why the string (not the row id) is stored.
    pub fn formatted(&self) -> String {
        format!("{} {} {}", self.country, self.postal_code, self.street)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// One checkout attempt.
///
/// Never mutated after creation: the provider-side payment status is read
/// from the gateway on demand rather than stored here, so there is no second
/// copy to drift out of sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    /// Surrogate id (UUID v4).
    pub id: String,

    /// The purchasing user.
    pub user_id: i64,

    /// Caller-supplied idempotency key, unique across all payments.
    /// A second checkout with the same key is a duplicate submission.
    pub merchant_payment_id: String,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Shipment
// =============================================================================

/// The delivery record created 1:1 with a payment.
///
/// Status is derived, not stored; see [`crate::status`] for the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Shipment {
    pub id: String,

    /// Owning payment (1:1).
    pub payment_id: String,

    /// Formatted address snapshot taken at checkout time.
    pub delivery_address: String,

    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub payment_failed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Shipment {
    /// The derived display status. This is the only sanctioned way to turn
    /// the timestamp columns into a status.
    pub fn status(&self) -> ShipmentStatus {
        ShipmentStatus::derive(
            self.shipped_at,
            self.delivered_at,
            self.cancelled_at,
            self.payment_failed_at,
        )
    }
}

// =============================================================================
// Purchased Line Item
// =============================================================================

/// One row per distinct product in a checkout. Immutable after the
/// fulfillment transaction commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchasedItem {
    pub id: String,
    pub payment_id: String,
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price snapshotted at checkout, in minor units.
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Lottery
// =============================================================================

/// Lifecycle of a lottery event. Administered outside this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum LotteryEventStatus {
    Draft,
    Active,
    Finished,
    Cancelled,
}

/// A time-boxed draw window. Read-only to this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LotteryEvent {
    pub id: i64,
    pub title: String,
    pub status: LotteryEventStatus,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub result_at: Option<DateTime<Utc>>,
    pub payment_deadline_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LotteryEvent {
    /// Whether entries are accepted at `now`: the event must be active and
    /// inside its draw window.
    pub fn accepts_entries_at(&self, now: DateTime<Utc>) -> bool {
        self.status == LotteryEventStatus::Active && self.start_at <= now && now < self.end_at
    }
}

/// A capped allocation of one product inside a lottery event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LotteryProduct {
    pub id: i64,
    pub lottery_event_id: i64,
    pub product_id: i64,
    /// How many entries the allocation can hold in total.
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// A user's entry against an allocation. At most one per
/// (user, allocation) pair, enforced by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LotteryEntry {
    pub id: String,
    pub lottery_event_id: i64,
    pub user_id: i64,
    pub lottery_product_id: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Auction
// =============================================================================

/// A sealed-bid auction for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Auction {
    pub id: i64,
    pub product_id: i64,
    /// Lowest acceptable bid, in minor units.
    pub minimum_bid: Money,
    /// While sealed, users see only their own bid.
    pub is_sealed: bool,
    /// When set, a re-bid replaces the user's earlier bid.
    pub allow_bid_retraction: bool,
    /// Whether payment details must be on file before bidding (enforced by
    /// the surrounding application).
    pub require_payment_info: bool,
    pub created_at: DateTime<Utc>,
}

/// A user's bid. At most one per (auction, user); see the auction policy
/// flags for whether it can be replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SealedBid {
    pub id: String,
    pub auction_id: i64,
    pub user_id: i64,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn address_formatted_snapshot() {
        let addr = Address {
            id: "a1".into(),
            user_id: 123,
            country: "JP".into(),
            postal_code: "150-0001".into(),
            street: "Jingumae 1-2-3".into(),
            recipient_name: "Hana Sato".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(addr.formatted(), "JP 150-0001 Jingumae 1-2-3");
    }

    #[test]
    fn shipment_status_uses_single_derivation() {
        let now = Utc::now();
        let shipment = Shipment {
            id: "s1".into(),
            payment_id: "p1".into(),
            delivery_address: "JP 150-0001 Jingumae 1-2-3".into(),
            shipped_at: Some(now),
            delivered_at: None,
            cancelled_at: None,
            payment_failed_at: Some(now),
            created_at: now,
        };
        // Priority: payment_failed wins over shipped.
        assert_eq!(shipment.status(), ShipmentStatus::PaymentFailed);
    }

    #[test]
    fn event_window_checks() {
        let now = Utc::now();
        let mut event = LotteryEvent {
            id: 1,
            title: "Summer draw".into(),
            status: LotteryEventStatus::Active,
            start_at: now - Duration::hours(1),
            end_at: now + Duration::hours(1),
            result_at: None,
            payment_deadline_at: None,
            created_at: now,
        };
        assert!(event.accepts_entries_at(now));

        event.status = LotteryEventStatus::Finished;
        assert!(!event.accepts_entries_at(now));

        event.status = LotteryEventStatus::Active;
        assert!(!event.accepts_entries_at(now + Duration::hours(2)));
        assert!(!event.accepts_entries_at(now - Duration::hours(2)));
    }
}
