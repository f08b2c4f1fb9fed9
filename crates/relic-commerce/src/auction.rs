//! # Sealed-Bid Ledger
//!
//! Durable recording of bids. Winner determination is not this engine's
//! job; what is enforced here:
//!
//! - the bid must meet the auction's minimum
//! - one bid per (auction, user): when the auction allows retraction a
//!   re-bid replaces the earlier one, otherwise it is rejected
//! - while a sealed auction runs, a user sees only their own bid

use chrono::Utc;
use tracing::info;

use relic_core::{Money, SealedBid};
use relic_db::Database;

use crate::error::BidError;

/// Auction bid service.
#[derive(Clone)]
pub struct AuctionService {
    db: Database,
}

impl AuctionService {
    pub fn new(db: Database) -> Self {
        AuctionService { db }
    }

    /// Places (or, where allowed, replaces) a user's bid.
    pub async fn place_bid(
        &self,
        auction_id: i64,
        user_id: i64,
        amount: Money,
    ) -> Result<SealedBid, BidError> {
        let repo = self.db.auctions();
        let now = Utc::now();

        let auction = repo
            .find_auction(auction_id)
            .await?
            .ok_or(BidError::AuctionNotFound { auction_id })?;

        if amount < auction.minimum_bid {
            return Err(BidError::BelowMinimum {
                minimum: auction.minimum_bid,
                offered: amount,
            });
        }

        let bid = match repo.insert_bid(auction_id, user_id, amount, now).await {
            Ok(bid) => bid,
            Err(err) if err.is_unique_violation_on("sealed_bids") => {
                if !auction.allow_bid_retraction {
                    return Err(BidError::DuplicateBid);
                }
                // Retraction allowed: the new amount replaces the old bid.
                // The row is known to exist (it just won the UNIQUE race).
                repo.replace_bid(auction_id, user_id, amount, now)
                    .await?
                    .ok_or(BidError::DuplicateBid)?
            }
            Err(err) => return Err(err.into()),
        };

        info!(auction_id, user_id, amount = %amount, "Sealed bid recorded");
        Ok(bid)
    }

    /// The bids a viewer may see on an auction.
    ///
    /// Sealed auctions expose only the viewer's own bid; open auctions
    /// expose all bids, highest first.
    pub async fn visible_bids(
        &self,
        auction_id: i64,
        viewer_id: i64,
    ) -> Result<Vec<SealedBid>, BidError> {
        let repo = self.db.auctions();

        let auction = repo
            .find_auction(auction_id)
            .await?
            .ok_or(BidError::AuctionNotFound { auction_id })?;

        if auction.is_sealed {
            Ok(repo
                .find_bid(auction_id, viewer_id)
                .await?
                .into_iter()
                .collect())
        } else {
            Ok(repo.bids_for_auction(auction_id).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_db::DbConfig;

    /// Seeds users 5 and 6, and three auctions:
    /// - auction 1: sealed, min 5000, no retraction
    /// - auction 2: sealed, min 5000, retraction allowed
    /// - auction 3: open (not sealed), min 1000, no retraction
    async fn setup() -> AuctionService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        for user_id in [5_i64, 6] {
            sqlx::query("INSERT INTO users (id, created_at) VALUES (?1, ?2)")
                .bind(user_id)
                .bind(now)
                .execute(db.pool())
                .await
                .unwrap();
        }

        for (minimum, is_sealed, retraction) in
            [(5000_i64, true, false), (5000, true, true), (1000, false, false)]
        {
            sqlx::query(
                "INSERT INTO auctions (product_id, minimum_bid, is_sealed, \
                 allow_bid_retraction, require_payment_info, created_at) \
                 VALUES (42, ?1, ?2, ?3, 0, ?4)",
            )
            .bind(minimum)
            .bind(is_sealed)
            .bind(retraction)
            .bind(now)
            .execute(db.pool())
            .await
            .unwrap();
        }

        AuctionService::new(db)
    }

    #[tokio::test]
    async fn bid_below_minimum_is_rejected() {
        let service = setup().await;

        let err = service.place_bid(1, 5, Money::new(4999)).await.unwrap_err();
        assert!(matches!(
            err,
            BidError::BelowMinimum { minimum, offered }
                if minimum == Money::new(5000) && offered == Money::new(4999)
        ));
    }

    #[tokio::test]
    async fn rebid_without_retraction_is_duplicate() {
        let service = setup().await;

        service.place_bid(1, 5, Money::new(6000)).await.unwrap();
        let err = service.place_bid(1, 5, Money::new(7000)).await.unwrap_err();
        assert!(matches!(err, BidError::DuplicateBid));

        // The original amount stands.
        let bid = service
            .db
            .auctions()
            .find_bid(1, 5)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bid.amount, Money::new(6000));
    }

    #[tokio::test]
    async fn rebid_with_retraction_replaces() {
        let service = setup().await;

        let first = service.place_bid(2, 5, Money::new(6000)).await.unwrap();
        let second = service.place_bid(2, 5, Money::new(8000)).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.amount, Money::new(8000));
        assert_eq!(
            service.db.auctions().bids_for_auction(2).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn bids_are_independent_per_user() {
        let service = setup().await;

        service.place_bid(1, 5, Money::new(6000)).await.unwrap();
        service.place_bid(1, 6, Money::new(7000)).await.unwrap();

        assert_eq!(
            service.db.auctions().bids_for_auction(1).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn sealed_auction_hides_other_bids() {
        let service = setup().await;

        service.place_bid(1, 5, Money::new(6000)).await.unwrap();
        service.place_bid(1, 6, Money::new(7000)).await.unwrap();

        let visible = service.visible_bids(1, 5).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].user_id, 5);
    }

    #[tokio::test]
    async fn open_auction_shows_all_bids() {
        let service = setup().await;

        service.place_bid(3, 5, Money::new(1500)).await.unwrap();
        service.place_bid(3, 6, Money::new(2500)).await.unwrap();

        let visible = service.visible_bids(3, 5).await.unwrap();
        assert_eq!(visible.len(), 2);
        // Highest first.
        assert_eq!(visible[0].amount, Money::new(2500));
    }

    #[tokio::test]
    async fn unknown_auction_is_not_found() {
        let service = setup().await;

        assert!(matches!(
            service.place_bid(99, 5, Money::new(9000)).await.unwrap_err(),
            BidError::AuctionNotFound { auction_id: 99 }
        ));
        assert!(matches!(
            service.visible_bids(99, 5).await.unwrap_err(),
            BidError::AuctionNotFound { auction_id: 99 }
        ));
    }
}
