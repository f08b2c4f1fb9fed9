//! # Repository Module
//!
//! Database repository implementations for Relic Store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Service (relic-commerce)                                               │
//! │       │                                                                 │
//! │       │  db.lottery().insert_entry(event, user, allocation, now)        │
//! │       ▼                                                                 │
//! │  LotteryRepository                                                      │
//! │  ├── find_event(&self, id)                                              │
//! │  ├── find_product(&self, id)                                            │
//! │  └── insert_entry(&self, ...)   ← SQL isolated here                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fulfillment writes (payment + shipment + line items) are a special case:
//! they run on a transactional connection handed in by the caller, so those
//! entry points take `&mut SqliteConnection` instead of using the pool.
//!
//! ## Available Repositories
//!
//! - [`address::AddressRepository`] - Address lookup and upsert
//! - [`payment::PaymentRepository`] - Payment, shipment, line-item writes and reads
//! - [`lottery::LotteryRepository`] - Events, allocations, capacity-guarded entries
//! - [`auction::AuctionRepository`] - Auctions and sealed bids
//! - [`shipment::ShipmentRepository`] - Milestone timestamp updates

pub mod address;
pub mod auction;
pub mod lottery;
pub mod payment;
pub mod shipment;
