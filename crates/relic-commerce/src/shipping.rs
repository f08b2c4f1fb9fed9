//! # Shipment Status Updates
//!
//! Admin-triggered transitions through the shipment state machine. The
//! rules live in relic-core; this service wires them to storage:
//!
//! 1. load the shipment (`NotFound` if absent)
//! 2. validate current → target against the state machine
//! 3. write the single milestone timestamp with the repository's NULL
//!    guard, which re-checks the terminal columns so a concurrent admin
//!    cannot sneak a transition past a stale read

use chrono::Utc;
use tracing::info;

use relic_core::{Shipment, ShipmentStatus};
use relic_db::{Database, DbError};

use crate::error::ShipmentUpdateError;

/// Shipment status service.
#[derive(Clone)]
pub struct ShippingService {
    db: Database,
}

impl ShippingService {
    pub fn new(db: Database) -> Self {
        ShippingService { db }
    }

    /// Applies one status transition and returns the updated shipment.
    pub async fn update_shipment_status(
        &self,
        shipment_id: &str,
        target: ShipmentStatus,
    ) -> Result<Shipment, ShipmentUpdateError> {
        let repo = self.db.shipments();

        let shipment = repo
            .find_by_id(shipment_id)
            .await?
            .ok_or_else(|| ShipmentUpdateError::NotFound {
                shipment_id: shipment_id.to_string(),
            })?;

        shipment.status().validate_transition(target)?;

        let updated = repo.record_milestone(shipment_id, target, Utc::now()).await?;
        if !updated {
            // The guard refused: the shipment moved since we read it.
            // Re-derive against the current row so the caller gets the
            // accurate rejection.
            let current = repo
                .find_by_id(shipment_id)
                .await?
                .ok_or_else(|| ShipmentUpdateError::NotFound {
                    shipment_id: shipment_id.to_string(),
                })?;
            return Err(match current.status().validate_transition(target) {
                Err(status_err) => status_err.into(),
                Ok(()) => ShipmentUpdateError::Persistence(DbError::QueryFailed(
                    "milestone update raced and lost".to_string(),
                )),
            });
        }

        let updated_shipment = repo
            .find_by_id(shipment_id)
            .await?
            .ok_or_else(|| ShipmentUpdateError::NotFound {
                shipment_id: shipment_id.to_string(),
            })?;

        info!(
            shipment_id,
            status = %updated_shipment.status(),
            "Shipment status updated"
        );
        Ok(updated_shipment)
    }

    /// The derived display status of a shipment.
    pub async fn shipment_status(
        &self,
        shipment_id: &str,
    ) -> Result<ShipmentStatus, ShipmentUpdateError> {
        let shipment = self
            .db
            .shipments()
            .find_by_id(shipment_id)
            .await?
            .ok_or_else(|| ShipmentUpdateError::NotFound {
                shipment_id: shipment_id.to_string(),
            })?;

        Ok(shipment.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_core::StatusError;
    use relic_db::{DbConfig, PaymentRepository};

    async fn setup() -> (ShippingService, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        sqlx::query("INSERT INTO users (id, created_at) VALUES (123, ?1)")
            .bind(now)
            .execute(db.pool())
            .await
            .unwrap();

        let shipment = db
            .run_in_transaction::<_, DbError, _>(move |conn| {
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
            .unwrap();

        (ShippingService::new(db), shipment.id)
    }

    #[tokio::test]
    async fn lifecycle_processing_shipped_delivered() {
        let (service, id) = setup().await;

        assert_eq!(
            service.shipment_status(&id).await.unwrap(),
            ShipmentStatus::Processing
        );

        let shipped = service
            .update_shipment_status(&id, ShipmentStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.status(), ShipmentStatus::Shipped);
        assert!(shipped.shipped_at.is_some());
        assert!(shipped.delivered_at.is_none());

        let delivered = service
            .update_shipment_status(&id, ShipmentStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(delivered.status(), ShipmentStatus::Delivered);
    }

    #[tokio::test]
    async fn terminal_states_accept_no_further_updates() {
        let (service, id) = setup().await;

        service
            .update_shipment_status(&id, ShipmentStatus::Cancelled)
            .await
            .unwrap();

        for target in [
            ShipmentStatus::Shipped,
            ShipmentStatus::Delivered,
            ShipmentStatus::PaymentFailed,
            ShipmentStatus::Cancelled,
        ] {
            let err = service
                .update_shipment_status(&id, target)
                .await
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    ShipmentUpdateError::Transition(StatusError::Terminal { .. })
                ),
                "{target} should be rejected, got {err}"
            );
        }
    }

    #[tokio::test]
    async fn skipping_a_step_is_rejected() {
        let (service, id) = setup().await;

        let err = service
            .update_shipment_status(&id, ShipmentStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShipmentUpdateError::Transition(StatusError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn payment_failure_wins_the_display_priority() {
        let (service, id) = setup().await;

        service
            .update_shipment_status(&id, ShipmentStatus::Shipped)
            .await
            .unwrap();
        let failed = service
            .update_shipment_status(&id, ShipmentStatus::PaymentFailed)
            .await
            .unwrap();

        // Both shipped_at and payment_failed_at are set; the derived
        // status must be payment_failed, never shipped.
        assert!(failed.shipped_at.is_some());
        assert!(failed.payment_failed_at.is_some());
        assert_eq!(failed.status(), ShipmentStatus::PaymentFailed);
        assert_eq!(
            service.shipment_status(&id).await.unwrap(),
            ShipmentStatus::PaymentFailed
        );
    }

    #[tokio::test]
    async fn unknown_shipment_is_not_found() {
        let (service, _) = setup().await;

        let err = service
            .update_shipment_status("no-such-id", ShipmentStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, ShipmentUpdateError::NotFound { .. }));

        let err = service.shipment_status("no-such-id").await.unwrap_err();
        assert!(matches!(err, ShipmentUpdateError::NotFound { .. }));
    }
}
