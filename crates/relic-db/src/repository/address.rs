//! # Address Repository
//!
//! Read and upsert operations for shipping addresses.
//!
//! A user has at most one address: registering again replaces the existing
//! row in place (`ON CONFLICT (user_id) DO UPDATE`). Order fulfillment only
//! ever reads; the address is a precondition, not something checkout
//! mutates.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use relic_core::Address;

const ADDRESS_COLUMNS: &str =
    "id, user_id, country, postal_code, street, recipient_name, created_at, updated_at";

/// Repository for address database operations.
#[derive(Debug, Clone)]
pub struct AddressRepository {
    pool: SqlitePool,
}

impl AddressRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AddressRepository { pool }
    }

    /// Fetches a user's registered address, if any.
    ///
    /// This is the checkout precondition: no address, no payment.
    pub async fn find_by_user_id(&self, user_id: i64) -> DbResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = ?1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(address)
    }

    /// Creates the user's address, or replaces it if one exists.
    pub async fn upsert(
        &self,
        user_id: i64,
        country: &str,
        postal_code: &str,
        street: &str,
        recipient_name: &str,
    ) -> DbResult<Address> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        debug!(user_id, "Upserting shipping address");

        sqlx::query(
            r#"
            INSERT INTO addresses (
                id, user_id, country, postal_code, street, recipient_name,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT (user_id) DO UPDATE SET
                country = excluded.country,
                postal_code = excluded.postal_code,
                street = excluded.street,
                recipient_name = excluded.recipient_name,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(country)
        .bind(postal_code)
        .bind(street)
        .bind(recipient_name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_user_id(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Address", user_id))
    }
}
