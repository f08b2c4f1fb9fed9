//! # Lottery Repository
//!
//! Reads of lottery events and allocations, and the capacity-guarded entry
//! insert.
//!
//! ## Scarcity Enforcement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two rules, both enforced by the database, never by pre-reads:          │
//! │                                                                         │
//! │  1. One entry per (user, allocation)                                    │
//! │     UNIQUE(user_id, lottery_product_id) → UniqueViolation               │
//! │                                                                         │
//! │  2. No more entries than the allocation holds                           │
//! │     INSERT ... SELECT ... WHERE COUNT(entries) < quantity               │
//! │     rows_affected == 0 → allocation exhausted                           │
//! │                                                                         │
//! │  A read-then-insert check would let two racing requests both pass       │
//! │  the read; the conditional INSERT is atomic.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use relic_core::{LotteryEntry, LotteryEvent, LotteryProduct};

const EVENT_COLUMNS: &str = "id, title, status, start_at, end_at, result_at, \
                             payment_deadline_at, created_at";
const PRODUCT_COLUMNS: &str = "id, lottery_event_id, product_id, quantity, created_at";
const ENTRY_COLUMNS: &str = "id, lottery_event_id, user_id, lottery_product_id, created_at";

/// Repository for lottery database operations.
#[derive(Debug, Clone)]
pub struct LotteryRepository {
    pool: SqlitePool,
}

impl LotteryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LotteryRepository { pool }
    }

    /// Fetches a lottery event. Events are administered elsewhere;
    /// this engine only reads them.
    pub async fn find_event(&self, event_id: i64) -> DbResult<Option<LotteryEvent>> {
        let event = sqlx::query_as::<_, LotteryEvent>(&format!(
            "SELECT {EVENT_COLUMNS} FROM lottery_events WHERE id = ?1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Fetches an allocation (lottery product).
    pub async fn find_product(&self, product_id: i64) -> DbResult<Option<LotteryProduct>> {
        let product = sqlx::query_as::<_, LotteryProduct>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM lottery_products WHERE id = ?1"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Records a user's entry against an allocation.
    ///
    /// ## Returns
    /// - `Ok(Some(entry))` - recorded
    /// - `Ok(None)` - the allocation is full (capacity guard said no)
    /// - `Err(UniqueViolation)` - the user already entered this allocation
    pub async fn insert_entry(
        &self,
        event_id: i64,
        user_id: i64,
        allocation_id: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<LotteryEntry>> {
        let entry = LotteryEntry {
            id: Uuid::new_v4().to_string(),
            lottery_event_id: event_id,
            user_id,
            lottery_product_id: allocation_id,
            created_at: now,
        };

        debug!(event_id, user_id, allocation_id, "Recording lottery entry");

        // Conditional insert: the row only materializes while the entry
        // count is below the allocation quantity. Atomic, so concurrent
        // entries cannot oversell the allocation.
        let result = sqlx::query(
            r#"
            INSERT INTO lottery_entries (
                id, lottery_event_id, user_id, lottery_product_id, created_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE (SELECT COUNT(*) FROM lottery_entries WHERE lottery_product_id = ?4)
                < (SELECT quantity FROM lottery_products WHERE id = ?4)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.lottery_event_id)
        .bind(entry.user_id)
        .bind(entry.lottery_product_id)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// A user's entries, newest first.
    pub async fn entries_for_user(&self, user_id: i64) -> DbResult<Vec<LotteryEntry>> {
        let entries = sqlx::query_as::<_, LotteryEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM lottery_entries \
             WHERE user_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// How many entries an allocation currently holds.
    pub async fn entry_count(&self, allocation_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lottery_entries WHERE lottery_product_id = ?1",
        )
        .bind(allocation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
