//! # Shipment Repository
//!
//! Milestone timestamp writes for the shipment status machine.
//!
//! The status rules (which transitions exist, which states are terminal)
//! live in relic-core. This repository contributes the race-safe write: the
//! UPDATE re-checks the terminal columns are still NULL, so a transition
//! that validated against a stale read cannot land on a shipment another
//! admin just closed.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use relic_core::{Shipment, ShipmentStatus};

const SHIPMENT_COLUMNS: &str = "id, payment_id, delivery_address, shipped_at, delivered_at, \
                                cancelled_at, payment_failed_at, created_at";

/// Repository for shipment database operations.
#[derive(Debug, Clone)]
pub struct ShipmentRepository {
    pool: SqlitePool,
}

impl ShipmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShipmentRepository { pool }
    }

    pub async fn find_by_id(&self, shipment_id: &str) -> DbResult<Option<Shipment>> {
        let shipment = sqlx::query_as::<_, Shipment>(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = ?1"
        ))
        .bind(shipment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shipment)
    }

    /// Writes the milestone timestamp for `target`, guarded.
    ///
    /// ## Guard
    /// The UPDATE only applies while
    /// - no terminal timestamp is set, and
    /// - for `shipped`: `shipped_at` is still NULL
    /// - for `delivered`: `shipped_at` is set and `delivered_at` is NULL
    ///
    /// ## Returns
    /// `true` when the timestamp landed; `false` when the guard refused,
    /// i.e. the shipment moved concurrently since the caller validated.
    pub async fn record_milestone(
        &self,
        shipment_id: &str,
        target: ShipmentStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let column = target.milestone_column().ok_or_else(|| {
            DbError::QueryFailed(format!("{target} is not a recordable milestone"))
        })?;

        debug!(shipment_id, %target, "Recording shipment milestone");

        // `column` comes from the fixed set in relic-core, never from input.
        let sql = match target {
            ShipmentStatus::Shipped => format!(
                "UPDATE shipments SET {column} = ?2 WHERE id = ?1 \
                 AND shipped_at IS NULL \
                 AND delivered_at IS NULL AND cancelled_at IS NULL \
                 AND payment_failed_at IS NULL"
            ),
            ShipmentStatus::Delivered => format!(
                "UPDATE shipments SET {column} = ?2 WHERE id = ?1 \
                 AND shipped_at IS NOT NULL \
                 AND delivered_at IS NULL AND cancelled_at IS NULL \
                 AND payment_failed_at IS NULL"
            ),
            _ => format!(
                "UPDATE shipments SET {column} = ?2 WHERE id = ?1 \
                 AND delivered_at IS NULL AND cancelled_at IS NULL \
                 AND payment_failed_at IS NULL"
            ),
        };

        let result = sqlx::query(&sql)
            .bind(shipment_id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::payment::PaymentRepository;

    async fn seeded_shipment(db: &Database) -> Shipment {
        sqlx::query("INSERT INTO users (id, created_at) VALUES (123, '2026-01-01T00:00:00Z')")
            .execute(db.pool())
            .await
            .unwrap();

        let now = Utc::now();
        db.run_in_transaction::<_, DbError, _>(move |conn| {
            Box::pin(async move {
                let payment =
                    PaymentRepository::insert_payment(&mut *conn, 123, "M-ship", now).await?;
                PaymentRepository::insert_shipment(
                    &mut *conn,
                    &payment.id,
                    "JP 150-0001 Jingumae 1-2-3",
                    now,
                )
                .await
            })
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn milestones_progress_and_derive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shipment = seeded_shipment(&db).await;
        let repo = db.shipments();

        assert_eq!(shipment.status(), ShipmentStatus::Processing);

        assert!(repo
            .record_milestone(&shipment.id, ShipmentStatus::Shipped, Utc::now())
            .await
            .unwrap());
        let current = repo.find_by_id(&shipment.id).await.unwrap().unwrap();
        assert_eq!(current.status(), ShipmentStatus::Shipped);

        assert!(repo
            .record_milestone(&shipment.id, ShipmentStatus::Delivered, Utc::now())
            .await
            .unwrap());
        let current = repo.find_by_id(&shipment.id).await.unwrap().unwrap();
        assert_eq!(current.status(), ShipmentStatus::Delivered);
    }

    #[tokio::test]
    async fn guard_refuses_after_terminal_timestamp() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shipment = seeded_shipment(&db).await;
        let repo = db.shipments();

        assert!(repo
            .record_milestone(&shipment.id, ShipmentStatus::Cancelled, Utc::now())
            .await
            .unwrap());

        // Terminal: every further milestone bounces off the NULL guard.
        for target in [
            ShipmentStatus::Shipped,
            ShipmentStatus::Delivered,
            ShipmentStatus::PaymentFailed,
        ] {
            assert!(!repo
                .record_milestone(&shipment.id, target, Utc::now())
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn delivered_requires_shipped_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shipment = seeded_shipment(&db).await;
        let repo = db.shipments();

        assert!(!repo
            .record_milestone(&shipment.id, ShipmentStatus::Delivered, Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn processing_is_not_recordable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shipment = seeded_shipment(&db).await;

        let err = db
            .shipments()
            .record_milestone(&shipment.id, ShipmentStatus::Processing, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
    }
}
