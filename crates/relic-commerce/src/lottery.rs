//! # Lottery Entry Allocation
//!
//! Records entries against capped allocations. Three gates, in order:
//!
//! 1. the event must exist, be active, and be inside its draw window
//! 2. the allocation must exist and belong to that event
//! 3. the insert itself is guarded: the UNIQUE index rejects a second entry
//!    by the same user, and the capacity condition rejects entries beyond
//!    the allocation quantity
//!
//! Gates 1-2 are reads and can go stale under concurrency; gate 3 is
//! enforced by the database and cannot.

use chrono::Utc;
use tracing::info;

use relic_core::LotteryEntry;
use relic_db::Database;

use crate::error::AllocationError;

/// Lottery entry service.
#[derive(Clone)]
pub struct LotteryService {
    db: Database,
}

impl LotteryService {
    pub fn new(db: Database) -> Self {
        LotteryService { db }
    }

    /// Enters a user into an allocation of a lottery event.
    ///
    /// ## Failure Modes
    /// - [`AllocationError::EventNotFound`] / [`AllocationError::EventClosed`]
    /// - [`AllocationError::AllocationNotFound`] - unknown allocation, or an
    ///   allocation of a different event
    /// - [`AllocationError::AllocationExhausted`] - capacity reached
    /// - [`AllocationError::DuplicateEntry`] - the user already entered
    pub async fn enter_lottery(
        &self,
        event_id: i64,
        user_id: i64,
        allocation_id: i64,
    ) -> Result<LotteryEntry, AllocationError> {
        let repo = self.db.lottery();
        let now = Utc::now();

        let event = repo
            .find_event(event_id)
            .await?
            .ok_or(AllocationError::EventNotFound { event_id })?;

        if !event.accepts_entries_at(now) {
            return Err(AllocationError::EventClosed { event_id });
        }

        let allocation = repo
            .find_product(allocation_id)
            .await?
            .ok_or(AllocationError::AllocationNotFound { allocation_id })?;

        if allocation.lottery_event_id != event_id {
            // Mismatched pair: treat like an unknown allocation rather than
            // silently entering a different event's draw.
            return Err(AllocationError::AllocationNotFound { allocation_id });
        }

        let entry = repo
            .insert_entry(event_id, user_id, allocation_id, now)
            .await?
            .ok_or(AllocationError::AllocationExhausted { allocation_id })?;

        info!(event_id, user_id, allocation_id, "Lottery entry recorded");
        Ok(entry)
    }

    /// A user's entries across all events, newest first.
    pub async fn entries_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<LotteryEntry>, AllocationError> {
        Ok(self.db.lottery().entries_for_user(user_id).await?)
    }
}
