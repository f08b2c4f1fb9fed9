//! # relic-commerce: Caller-Facing Fulfillment & Allocation Services
//!
//! The operations the surrounding application (pages, admin screens, API
//! handlers) calls. Each service is a thin orchestration over relic-core
//! rules, relic-db storage, and the relic-gateway adapter.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CheckoutService::fulfill_order      → payable URL | FulfillmentError   │
//! │  CheckoutService::payment_status     → provider status                  │
//! │  LotteryService::enter_lottery       → LotteryEntry | AllocationError   │
//! │  AuctionService::place_bid           → SealedBid | BidError             │
//! │  ShippingService::update_shipment_status                                │
//! │                                      → Shipment | ShipmentUpdateError   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Composition
//! [`Storefront::connect`] is the composition root: it builds the database
//! pool and the gateway client from a [`StoreConfig`] constructed once at
//! startup, then hands out the services. Requests are stateless; the only
//! shared mutable resource is the database.

pub mod auction;
pub mod checkout;
pub mod config;
pub mod error;
pub mod lottery;
pub mod shipping;

pub use auction::AuctionService;
pub use checkout::CheckoutService;
pub use config::{ConfigError, StoreConfig};
pub use error::{AllocationError, BidError, FulfillmentError, ShipmentUpdateError};
pub use lottery::LotteryService;
pub use shipping::ShippingService;

use std::sync::Arc;

use thiserror::Error;

use relic_db::{Database, DbError};
use relic_gateway::{GatewayError, PayPayClient, PaymentGateway};

/// Failures while wiring the engine together at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database initialization failed: {0}")]
    Db(#[from] DbError),

    #[error("gateway client initialization failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// The assembled storefront engine.
#[derive(Clone)]
pub struct Storefront {
    db: Database,
    checkout: CheckoutService,
    lottery: LotteryService,
    auctions: AuctionService,
    shipping: ShippingService,
}

impl Storefront {
    /// Connects to the database, builds the gateway client, and wires the
    /// services. Call once at startup.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StartupError> {
        let db = Database::new(config.db_config()).await?;
        let gateway: Arc<dyn PaymentGateway> =
            Arc::new(PayPayClient::new(config.gateway_config())?);
        Ok(Storefront::with_parts(db, gateway, &config.currency))
    }

    /// Wires the services from already-built parts. Used by `connect` and
    /// by tests that inject a scripted gateway.
    pub fn with_parts(
        db: Database,
        gateway: Arc<dyn PaymentGateway>,
        currency: &str,
    ) -> Self {
        Storefront {
            checkout: CheckoutService::new(db.clone(), gateway, currency),
            lottery: LotteryService::new(db.clone()),
            auctions: AuctionService::new(db.clone()),
            shipping: ShippingService::new(db.clone()),
            db,
        }
    }

    pub fn checkout(&self) -> &CheckoutService {
        &self.checkout
    }

    pub fn lottery(&self) -> &LotteryService {
        &self.lottery
    }

    pub fn auctions(&self) -> &AuctionService {
        &self.auctions
    }

    pub fn shipping(&self) -> &ShippingService {
        &self.shipping
    }

    /// The underlying database handle, for the surrounding application's
    /// own read surfaces.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_core::{OrderItem, ShipmentStatus};
    use relic_db::DbConfig;
    use relic_gateway::MockGateway;

    #[tokio::test]
    async fn connect_wires_the_engine() {
        let mut config = StoreConfig::from_env().unwrap();
        config.database_path = ":memory:".into();

        let store = Storefront::connect(&config).await.unwrap();
        assert!(store.database().health_check().await);
    }

    /// Checkout through shipment delivery, across service boundaries.
    #[tokio::test]
    async fn checkout_to_delivery_end_to_end() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query("INSERT INTO users (id, created_at) VALUES (123, '2026-01-01T00:00:00Z')")
            .execute(db.pool())
            .await
            .unwrap();
        db.addresses()
            .upsert(123, "JP", "150-0001", "Jingumae 1-2-3", "Hana Sato")
            .await
            .unwrap();

        let store = Storefront::with_parts(db, Arc::new(MockGateway::succeeding()), "JPY");

        let code = store
            .checkout()
            .fulfill_order(123, "M-e2e", &[OrderItem::new(7, 2, 1000)])
            .await
            .unwrap();
        assert!(code.url.contains("M-e2e"));

        let payment = store
            .database()
            .payments()
            .find_by_merchant_payment_id("M-e2e")
            .await
            .unwrap()
            .unwrap();
        let shipment = store
            .database()
            .payments()
            .shipment_for_payment(&payment.id)
            .await
            .unwrap()
            .unwrap();

        store
            .shipping()
            .update_shipment_status(&shipment.id, ShipmentStatus::Shipped)
            .await
            .unwrap();
        let delivered = store
            .shipping()
            .update_shipment_status(&shipment.id, ShipmentStatus::Delivered)
            .await
            .unwrap();

        assert_eq!(delivered.status(), ShipmentStatus::Delivered);
    }
}
