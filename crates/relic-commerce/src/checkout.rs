//! # Order Fulfillment
//!
//! Turns a checkout into durable state: one payment row keyed by the
//! caller's idempotency key, one shipment with the address snapshotted, one
//! line item per product, and a payable artifact from the gateway.
//!
//! ## The One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fulfill_order(user, merchant_payment_id, items)                        │
//! │                                                                         │
//! │  validate items ── read address (precondition, outside the tx)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    INSERT paypay_payments   ← UNIQUE(merchant_payment_id)               │
//! │    INSERT shipments         ← address snapshot                          │
//! │    INSERT payment_products  ← price snapshots                           │
//! │    gateway.create_payable_code(...)  ← bounded by request timeout       │
//! │  COMMIT ──────────────► return payable URL                              │
//! │    │                                                                    │
//! │    └─ any failure ────► ROLLBACK, nothing persists                      │
//! │                                                                         │
//! │  A payment that cannot be paid must not exist: a gateway failure        │
//! │  (rejection, missing URL, timeout) takes the payment, shipment and      │
//! │  line items down with it.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use relic_core::order::{order_description, order_total, validate_order};
use relic_core::{OrderItem, ValidationError};
use relic_db::{Database, PaymentRepository};
use relic_gateway::{CreateCodeRequest, GatewayOrderItem, PayableCode, PaymentDetails, PaymentGateway};

use crate::error::FulfillmentError;

/// Checkout service: the only writer of payments, shipments, and line
/// items.
#[derive(Clone)]
pub struct CheckoutService {
    db: Database,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl CheckoutService {
    pub fn new(db: Database, gateway: Arc<dyn PaymentGateway>, currency: impl Into<String>) -> Self {
        CheckoutService {
            db,
            gateway,
            currency: currency.into(),
        }
    }

    /// Fulfills a checkout. Returns the payable artifact on success.
    ///
    /// ## Failure Modes
    /// - [`FulfillmentError::InvalidOrder`] - bad items, nothing written
    /// - [`FulfillmentError::NoShippingAddress`] - precondition unmet
    /// - [`FulfillmentError::DuplicatePayment`] - idempotency key already
    ///   used; the first submission won
    /// - [`FulfillmentError::GatewayRejected`] - provider said no or timed
    ///   out; all rows rolled back
    pub async fn fulfill_order(
        &self,
        user_id: i64,
        merchant_payment_id: &str,
        items: &[OrderItem],
    ) -> Result<PayableCode, FulfillmentError> {
        if merchant_payment_id.is_empty() {
            return Err(ValidationError::EmptyMerchantPaymentId.into());
        }
        validate_order(items)?;
        let total = order_total(items)?;
        let description = order_description(items);

        // Precondition read. Deliberately outside the write transaction:
        // the address is read-only data for checkout.
        let address = self
            .db
            .addresses()
            .find_by_user_id(user_id)
            .await?
            .ok_or(FulfillmentError::NoShippingAddress { user_id })?;
        let delivery_address = address.formatted();

        let now = Utc::now();
        let gateway = Arc::clone(&self.gateway);
        let merchant_id = merchant_payment_id.to_string();
        let currency = self.currency.clone();
        let order_items = items.to_vec();

        let result = self
            .db
            .run_in_transaction(move |conn| {
                Box::pin(async move {
                    let payment = PaymentRepository::insert_payment(
                        &mut *conn,
                        user_id,
                        &merchant_id,
                        now,
                    )
                    .await?;

                    PaymentRepository::insert_shipment(
                        &mut *conn,
                        &payment.id,
                        &delivery_address,
                        now,
                    )
                    .await?;

                    PaymentRepository::insert_items(&mut *conn, &payment.id, &order_items, now)
                        .await?;

                    // The gateway call runs inside the open transaction on
                    // purpose: its failure must take the rows above down
                    // with it. The request timeout bounds the lock.
                    let request = CreateCodeRequest {
                        merchant_payment_id: merchant_id.clone(),
                        amount: total,
                        currency,
                        order_items: order_items
                            .iter()
                            .map(|item| GatewayOrderItem {
                                product_id: item.product_id,
                                quantity: item.quantity,
                                unit_price: item.unit_price,
                            })
                            .collect(),
                        order_description: description,
                    };

                    gateway
                        .create_payable_code(request)
                        .await
                        .map_err(FulfillmentError::GatewayRejected)
                })
            })
            .await;

        match &result {
            Ok(code) => info!(
                merchant_payment_id = %merchant_payment_id,
                user_id,
                amount = %total,
                url = %code.url,
                "Checkout fulfilled"
            ),
            Err(err) => warn!(
                merchant_payment_id = %merchant_payment_id,
                user_id,
                error = %err,
                "Checkout failed"
            ),
        }

        result
    }

    /// A user's payments, newest first.
    pub async fn payments_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<relic_core::Payment>, FulfillmentError> {
        Ok(self.db.payments().payments_for_user(user_id).await?)
    }

    /// The provider-side status of a checkout.
    ///
    /// Status is never stored locally; this reads the single source of
    /// truth. The payment row must exist, otherwise the id has never been
    /// through checkout here.
    pub async fn payment_status(
        &self,
        merchant_payment_id: &str,
    ) -> Result<PaymentDetails, FulfillmentError> {
        let payment = self
            .db
            .payments()
            .find_by_merchant_payment_id(merchant_payment_id)
            .await?
            .ok_or_else(|| FulfillmentError::PaymentNotFound {
                merchant_payment_id: merchant_payment_id.to_string(),
            })?;

        self.gateway
            .get_payment_details(&payment.merchant_payment_id)
            .await
            .map_err(FulfillmentError::GatewayRejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_db::DbConfig;
    use relic_gateway::{GatewayPaymentStatus, MockGateway};

    const USER: i64 = 123;

    async fn service_with(gateway: Arc<MockGateway>) -> CheckoutService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        sqlx::query("INSERT INTO users (id, created_at) VALUES (?1, '2026-01-01T00:00:00Z')")
            .bind(USER)
            .execute(db.pool())
            .await
            .unwrap();
        db.addresses()
            .upsert(USER, "JP", "150-0001", "Jingumae 1-2-3", "Hana Sato")
            .await
            .unwrap();

        CheckoutService::new(db, gateway, "JPY")
    }

    fn items() -> Vec<OrderItem> {
        vec![OrderItem::new(7, 2, 1000)]
    }

    #[tokio::test]
    async fn happy_path_creates_all_rows_and_returns_url() {
        let gateway = Arc::new(MockGateway::succeeding());
        let service = service_with(Arc::clone(&gateway)).await;

        let code = service.fulfill_order(USER, "M1", &items()).await.unwrap();
        assert_eq!(code.url, "https://pay.example/checkout/M1");

        let payments = service.db.payments();
        assert_eq!(
            payments.fulfillment_row_counts("M1").await.unwrap(),
            (1, 1, 1)
        );

        let payment = payments
            .find_by_merchant_payment_id("M1")
            .await
            .unwrap()
            .unwrap();
        let rows = payments.items_for_payment(&payment.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_id, 7);
        assert_eq!(rows[0].quantity, 2);
        assert_eq!(rows[0].unit_price.amount(), 1000);

        let shipment = payments
            .shipment_for_payment(&payment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shipment.delivery_address, "JP 150-0001 Jingumae 1-2-3");

        // The gateway saw the total and the item description.
        let requests = gateway.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount.amount(), 2000);
        assert_eq!(requests[0].order_description, "product 7 x2");
        assert_eq!(requests[0].currency, "JPY");

        let mine = service.payments_for_user(USER).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].merchant_payment_id, "M1");
    }

    #[tokio::test]
    async fn missing_address_fails_before_any_write() {
        let gateway = Arc::new(MockGateway::succeeding());
        let service = service_with(Arc::clone(&gateway)).await;

        // User 999 exists nowhere and certainly has no address.
        let err = service
            .fulfill_order(999, "M-no-addr", &items())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::NoShippingAddress { user_id: 999 }
        ));

        assert_eq!(
            service
                .db
                .payments()
                .fulfillment_row_counts("M-no-addr")
                .await
                .unwrap(),
            (0, 0, 0)
        );
        // The gateway was never consulted.
        assert!(gateway.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn duplicate_checkout_loses_to_the_first() {
        let service = service_with(Arc::new(MockGateway::succeeding())).await;

        service.fulfill_order(USER, "M2", &items()).await.unwrap();
        let err = service.fulfill_order(USER, "M2", &items()).await.unwrap_err();

        assert!(matches!(err, FulfillmentError::DuplicatePayment));
        assert_eq!(
            service.db.payments().fulfillment_row_counts("M2").await.unwrap().0,
            1
        );
    }

    #[tokio::test]
    async fn concurrent_duplicate_has_exactly_one_winner() {
        let service = service_with(Arc::new(MockGateway::succeeding())).await;

        let it = items();
        let (a, b) = tokio::join!(
            service.fulfill_order(USER, "M3", &it),
            service.fulfill_order(USER, "M3", &it),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one of the racers may win");
        for result in [a, b] {
            if let Err(err) = result {
                assert!(matches!(err, FulfillmentError::DuplicatePayment), "{err}");
            }
        }

        assert_eq!(
            service.db.payments().fulfillment_row_counts("M3").await.unwrap().0,
            1
        );
    }

    #[tokio::test]
    async fn gateway_rejection_rolls_everything_back() {
        let gateway = Arc::new(MockGateway::rejecting("UNACCEPTABLE_OP", "maintenance"));
        let service = service_with(Arc::clone(&gateway)).await;

        let err = service.fulfill_order(USER, "M4", &items()).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::GatewayRejected(_)));

        // Atomicity: the rows written before the gateway call are gone.
        assert_eq!(
            service.db.payments().fulfillment_row_counts("M4").await.unwrap(),
            (0, 0, 0)
        );
    }

    #[tokio::test]
    async fn missing_payable_url_also_rolls_back() {
        let gateway = Arc::new(MockGateway::without_url());
        let service = service_with(Arc::clone(&gateway)).await;

        let err = service.fulfill_order(USER, "M5", &items()).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::GatewayRejected(_)));
        assert_eq!(
            service.db.payments().fulfillment_row_counts("M5").await.unwrap(),
            (0, 0, 0)
        );

        // A failed attempt leaves the key unused: the same merchant
        // payment id can be retried once the caller knows nothing stuck.
        assert!(service.fulfill_order(USER, "M5", &items()).await.is_err());
        let gateway = Arc::new(MockGateway::succeeding());
        let service = CheckoutService::new(service.db.clone(), gateway, "JPY");
        service.fulfill_order(USER, "M5", &items()).await.unwrap();
    }

    #[tokio::test]
    async fn long_description_reaches_gateway_truncated() {
        let gateway = Arc::new(MockGateway::succeeding());
        let service = service_with(Arc::clone(&gateway)).await;

        // Enough distinct products to push the description past 200 chars.
        let many: Vec<OrderItem> = (1..=20)
            .map(|n| OrderItem::new(1_000_000 + n, 1, 100))
            .collect();

        service.fulfill_order(USER, "M6", &many).await.unwrap();

        let description = &gateway.recorded_requests()[0].order_description;
        assert!(description.chars().count() <= 200);
        assert!(description.ends_with("..."));
    }

    #[tokio::test]
    async fn invalid_orders_never_touch_storage() {
        let gateway = Arc::new(MockGateway::succeeding());
        let service = service_with(Arc::clone(&gateway)).await;

        let err = service.fulfill_order(USER, "M7", &[]).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::InvalidOrder(_)));

        let err = service.fulfill_order(USER, "", &items()).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::InvalidOrder(_)));

        assert!(gateway.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn payment_status_reads_the_gateway() {
        let gateway = Arc::new(MockGateway::succeeding());
        let service = service_with(Arc::clone(&gateway)).await;

        service.fulfill_order(USER, "M8", &items()).await.unwrap();

        gateway.set_payment_details(relic_gateway::PaymentDetails {
            status: GatewayPaymentStatus::Completed,
            requested_at: None,
            accepted_at: None,
            amount: relic_core::Money::new(2000),
        });

        let details = service.payment_status("M8").await.unwrap();
        assert_eq!(details.status, GatewayPaymentStatus::Completed);

        let err = service.payment_status("M-unknown").await.unwrap_err();
        assert!(matches!(err, FulfillmentError::PaymentNotFound { .. }));
    }
}
