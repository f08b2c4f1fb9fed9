//! # Auction Repository
//!
//! Reads of auctions and durable recording of sealed bids.
//!
//! One bid per (auction, user) is a UNIQUE index; whether a second
//! `place_bid` becomes a replacement or a rejection is decided by the
//! service layer from the auction's `allow_bid_retraction` flag. Winner
//! determination does not live in this engine.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use relic_core::{Auction, Money, SealedBid};

const AUCTION_COLUMNS: &str = "id, product_id, minimum_bid, is_sealed, allow_bid_retraction, \
                               require_payment_info, created_at";
const BID_COLUMNS: &str = "id, auction_id, user_id, amount, created_at, updated_at";

/// Repository for auction database operations.
#[derive(Debug, Clone)]
pub struct AuctionRepository {
    pool: SqlitePool,
}

impl AuctionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuctionRepository { pool }
    }

    pub async fn find_auction(&self, auction_id: i64) -> DbResult<Option<Auction>> {
        let auction = sqlx::query_as::<_, Auction>(&format!(
            "SELECT {AUCTION_COLUMNS} FROM auctions WHERE id = ?1"
        ))
        .bind(auction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(auction)
    }

    /// The bid a user has on an auction, if any.
    pub async fn find_bid(&self, auction_id: i64, user_id: i64) -> DbResult<Option<SealedBid>> {
        let bid = sqlx::query_as::<_, SealedBid>(&format!(
            "SELECT {BID_COLUMNS} FROM sealed_bids WHERE auction_id = ?1 AND user_id = ?2"
        ))
        .bind(auction_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bid)
    }

    /// Records a new bid.
    ///
    /// A second bid by the same user propagates as `UniqueViolation`; the
    /// service decides whether that means "replace" or "reject".
    pub async fn insert_bid(
        &self,
        auction_id: i64,
        user_id: i64,
        amount: Money,
        now: DateTime<Utc>,
    ) -> DbResult<SealedBid> {
        let bid = SealedBid {
            id: Uuid::new_v4().to_string(),
            auction_id,
            user_id,
            amount,
            created_at: now,
            updated_at: now,
        };

        debug!(auction_id, user_id, amount = %amount, "Recording sealed bid");

        sqlx::query(
            r#"
            INSERT INTO sealed_bids (id, auction_id, user_id, amount, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&bid.id)
        .bind(bid.auction_id)
        .bind(bid.user_id)
        .bind(bid.amount)
        .bind(bid.created_at)
        .bind(bid.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(bid)
    }

    /// Replaces the amount of a user's existing bid (retraction-allowed
    /// auctions). Returns the updated bid, or `None` when no bid exists.
    pub async fn replace_bid(
        &self,
        auction_id: i64,
        user_id: i64,
        amount: Money,
        now: DateTime<Utc>,
    ) -> DbResult<Option<SealedBid>> {
        debug!(auction_id, user_id, amount = %amount, "Replacing sealed bid");

        let result = sqlx::query(
            "UPDATE sealed_bids SET amount = ?3, updated_at = ?4 \
             WHERE auction_id = ?1 AND user_id = ?2",
        )
        .bind(auction_id)
        .bind(user_id)
        .bind(amount)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_bid(auction_id, user_id).await
    }

    /// All bids on an auction, highest first. Visibility filtering for
    /// sealed auctions happens in the service layer.
    pub async fn bids_for_auction(&self, auction_id: i64) -> DbResult<Vec<SealedBid>> {
        let bids = sqlx::query_as::<_, SealedBid>(&format!(
            "SELECT {BID_COLUMNS} FROM sealed_bids \
             WHERE auction_id = ?1 ORDER BY amount DESC, created_at"
        ))
        .bind(auction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn seed(db: &Database) {
        for user_id in [5, 6] {
            sqlx::query("INSERT INTO users (id, created_at) VALUES (?1, '2026-01-01T00:00:00Z')")
                .bind(user_id)
                .execute(db.pool())
                .await
                .unwrap();
        }
        sqlx::query(
            "INSERT INTO auctions (product_id, minimum_bid, is_sealed, allow_bid_retraction, \
             require_payment_info, created_at) \
             VALUES (42, 5000, 1, 0, 0, '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn bids_are_independent_per_user() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;
        let repo = db.auctions();

        repo.insert_bid(1, 5, Money::new(6000), Utc::now()).await.unwrap();
        repo.insert_bid(1, 6, Money::new(7000), Utc::now()).await.unwrap();

        let bids = repo.bids_for_auction(1).await.unwrap();
        assert_eq!(bids.len(), 2);
        assert_eq!(bids[0].amount, Money::new(7000));
    }

    #[tokio::test]
    async fn second_bid_by_same_user_violates_unique() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;
        let repo = db.auctions();

        repo.insert_bid(1, 5, Money::new(6000), Utc::now()).await.unwrap();
        let err = repo
            .insert_bid(1, 5, Money::new(8000), Utc::now())
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("sealed_bids"), "{err}");
    }

    #[tokio::test]
    async fn replace_updates_amount_in_place() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;
        let repo = db.auctions();

        let original = repo.insert_bid(1, 5, Money::new(6000), Utc::now()).await.unwrap();
        let replaced = repo
            .replace_bid(1, 5, Money::new(9000), Utc::now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.id, original.id);
        assert_eq!(replaced.amount, Money::new(9000));
        assert_eq!(repo.bids_for_auction(1).await.unwrap().len(), 1);

        // No bid to replace: None, not an error.
        assert!(repo
            .replace_bid(1, 6, Money::new(9000), Utc::now())
            .await
            .unwrap()
            .is_none());
    }
}
