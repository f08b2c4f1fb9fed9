//! # relic-core: Pure Business Logic for Relic Store
//!
//! This crate is the **heart** of the storefront engine. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Relic Store Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                relic-commerce (services)                        │   │
//! │  │   fulfill_order, enter_lottery, place_bid, update_shipment      │   │
//! │  └──────────┬────────────────────────────────────────┬─────────────┘   │
//! │             │                                        │                  │
//! │  ┌──────────▼──────────┐                  ┌──────────▼─────────────┐   │
//! │  │      relic-db       │                  │     relic-gateway      │   │
//! │  │  SQLite, sqlx pool  │                  │   payment provider     │   │
//! │  └──────────┬──────────┘                  └──────────┬─────────────┘   │
//! │             │                                        │                  │
//! │  ┌──────────▼────────────────────────────────────────▼─────────────┐   │
//! │  │                 ★ relic-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │   money   │  │   order   │  │  status   │   │   │
//! │  │   │  Payment  │  │   Money   │  │ OrderItem │  │ Shipment  │   │   │
//! │  │   │  Shipment │  │  checked  │  │  totals   │  │  status   │   │   │
//! │  │   │  Entry…   │  │   math    │  │ truncation│  │  machine  │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Payment, Shipment, LotteryEntry, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`order`] - Order items, totals, and the gateway description
//! - [`status`] - Shipment status derivation and transition guard
//! - [`error`] - Domain error types

pub mod error;
pub mod money;
pub mod order;
pub mod status;
pub mod types;

pub use error::{StatusError, ValidationError};
pub use money::Money;
pub use order::OrderItem;
pub use status::ShipmentStatus;
pub use types::*;

/// Maximum length of the order description sent to the payment gateway.
///
/// The provider rejects longer descriptions, so anything over this limit is
/// cut down to [`ORDER_DESCRIPTION_TRUNCATE_AT`] characters plus an ellipsis
/// marker before it leaves this system.
pub const ORDER_DESCRIPTION_MAX: usize = 200;

/// Length the description is cut to when it exceeds [`ORDER_DESCRIPTION_MAX`].
pub const ORDER_DESCRIPTION_TRUNCATE_AT: usize = 190;
