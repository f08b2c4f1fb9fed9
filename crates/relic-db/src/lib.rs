//! # relic-db: Database Layer for Relic Store
//!
//! This crate provides database access for the storefront engine. It uses
//! SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Relic Store Data Flow                             │
//! │                                                                         │
//! │  relic-commerce service (fulfill_order, enter_lottery, ...)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     relic-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │ address.rs    │    │  (embedded)  │   │   │
//! │  │   │               │    │ payment.rs    │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│ lottery.rs    │    │ 001_initial_ │   │   │
//! │  │   │ Transaction   │    │ auction.rs    │    │ schema.sql   │   │   │
//! │  │   │ boundary      │    │ shipment.rs   │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, foreign keys on)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, configuration, and the transaction boundary
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relic_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/relic.db")).await?;
//! let address = db.addresses().find_by_user_id(123).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{BoxFuture, Database, DbConfig};
pub use repository::address::AddressRepository;
pub use repository::auction::AuctionRepository;
pub use repository::lottery::LotteryRepository;
pub use repository::payment::PaymentRepository;
pub use repository::shipment::ShipmentRepository;
