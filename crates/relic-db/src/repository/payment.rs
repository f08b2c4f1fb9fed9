//! # Payment Repository
//!
//! Database operations for payments, their shipments, and purchased line
//! items.
//!
//! ## Fulfillment Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              One checkout = one transaction = three writes              │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    insert_payment()   → paypay_payments (idempotency key, UNIQUE)       │
//! │    insert_shipment()  → shipments (address snapshot, 1:1)               │
//! │    insert_items()     → payment_products (price snapshot, 1..n)         │
//! │    ... gateway call by the service layer ...                            │
//! │  COMMIT on success / ROLLBACK on any failure                            │
//! │                                                                         │
//! │  The write entry points take `&mut SqliteConnection` so they compose    │
//! │  under the caller's transaction instead of grabbing pool connections.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use relic_core::{OrderItem, Payment, PurchasedItem, Shipment};

const PAYMENT_COLUMNS: &str = "id, user_id, merchant_payment_id, created_at";
const SHIPMENT_COLUMNS: &str = "id, payment_id, delivery_address, shipped_at, delivered_at, \
                                cancelled_at, payment_failed_at, created_at";
const ITEM_COLUMNS: &str = "id, payment_id, product_id, quantity, unit_price, created_at";

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    // =========================================================================
    // Transactional writes (fulfillment)
    // =========================================================================

    /// Inserts the payment row for a checkout attempt.
    ///
    /// A UNIQUE violation on `merchant_payment_id` is the duplicate-checkout
    /// signal; it propagates as `DbError::UniqueViolation` for the service
    /// layer to map.
    pub async fn insert_payment(
        conn: &mut SqliteConnection,
        user_id: i64,
        merchant_payment_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Payment> {
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            user_id,
            merchant_payment_id: merchant_payment_id.to_string(),
            created_at: now,
        };

        debug!(
            payment_id = %payment.id,
            merchant_payment_id = %payment.merchant_payment_id,
            "Inserting payment"
        );

        sqlx::query(
            r#"
            INSERT INTO paypay_payments (id, user_id, merchant_payment_id, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&payment.id)
        .bind(payment.user_id)
        .bind(&payment.merchant_payment_id)
        .bind(payment.created_at)
        .execute(conn)
        .await?;

        Ok(payment)
    }

    /// Inserts the shipment row for a new payment.
    ///
    /// `delivery_address` is the formatted snapshot; the live address row is
    /// deliberately not referenced.
    pub async fn insert_shipment(
        conn: &mut SqliteConnection,
        payment_id: &str,
        delivery_address: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Shipment> {
        let shipment = Shipment {
            id: Uuid::new_v4().to_string(),
            payment_id: payment_id.to_string(),
            delivery_address: delivery_address.to_string(),
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            payment_failed_at: None,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO shipments (id, payment_id, delivery_address, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&shipment.id)
        .bind(&shipment.payment_id)
        .bind(&shipment.delivery_address)
        .bind(shipment.created_at)
        .execute(conn)
        .await?;

        Ok(shipment)
    }

    /// Inserts one purchased line item per order item, snapshotting the
    /// unit price the caller saw at checkout.
    pub async fn insert_items(
        conn: &mut SqliteConnection,
        payment_id: &str,
        items: &[OrderItem],
        now: DateTime<Utc>,
    ) -> DbResult<Vec<PurchasedItem>> {
        let mut purchased = Vec::with_capacity(items.len());

        for item in items {
            let row = PurchasedItem {
                id: Uuid::new_v4().to_string(),
                payment_id: payment_id.to_string(),
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO payment_products (
                    id, payment_id, product_id, quantity, unit_price, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&row.id)
            .bind(&row.payment_id)
            .bind(row.product_id)
            .bind(row.quantity)
            .bind(row.unit_price)
            .bind(row.created_at)
            .execute(&mut *conn)
            .await?;

            purchased.push(row);
        }

        Ok(purchased)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Looks a payment up by its idempotency key.
    pub async fn find_by_merchant_payment_id(
        &self,
        merchant_payment_id: &str,
    ) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM paypay_payments WHERE merchant_payment_id = ?1"
        ))
        .bind(merchant_payment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// All payments for a user, newest first.
    pub async fn payments_for_user(&self, user_id: i64) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM paypay_payments \
             WHERE user_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// The shipment belonging to a payment (1:1).
    pub async fn shipment_for_payment(&self, payment_id: &str) -> DbResult<Option<Shipment>> {
        let shipment = sqlx::query_as::<_, Shipment>(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE payment_id = ?1"
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shipment)
    }

    /// The purchased line items of a payment, in insertion order.
    pub async fn items_for_payment(&self, payment_id: &str) -> DbResult<Vec<PurchasedItem>> {
        let items = sqlx::query_as::<_, PurchasedItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM payment_products \
             WHERE payment_id = ?1 ORDER BY created_at"
        ))
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Row counts (payments, shipments, line items) attached to one
    /// merchant payment id. Used to audit fulfillment atomicity: after a
    /// failed checkout all three must be zero.
    pub async fn fulfillment_row_counts(
        &self,
        merchant_payment_id: &str,
    ) -> DbResult<(i64, i64, i64)> {
        let payments: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM paypay_payments WHERE merchant_payment_id = ?1",
        )
        .bind(merchant_payment_id)
        .fetch_one(&self.pool)
        .await?;

        let shipments: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shipments s \
             JOIN paypay_payments p ON p.id = s.payment_id \
             WHERE p.merchant_payment_id = ?1",
        )
        .bind(merchant_payment_id)
        .fetch_one(&self.pool)
        .await?;

        let items: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM payment_products i \
             JOIN paypay_payments p ON p.id = i.payment_id \
             WHERE p.merchant_payment_id = ?1",
        )
        .bind(merchant_payment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((payments, shipments, items))
    }
}
