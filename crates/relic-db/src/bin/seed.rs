//! # Seed Data Generator
//!
//! Populates a development database with demo users, an address, an active
//! lottery, and an auction, so the services have something to run against.
//!
//! ## Usage
//! ```bash
//! cargo run -p relic-db --bin seed
//!
//! # Specify database path
//! cargo run -p relic-db --bin seed -- --db ./data/relic.db
//! ```

use chrono::{Duration, Utc};
use std::env;
use tracing::info;

use relic_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./relic.db".to_string());
    info!(path = %db_path, "Seeding development database");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let (total, applied) = relic_db::migrations::migration_status(db.pool()).await?;
    info!(total, applied, "Migration status");

    let now = Utc::now();

    // Demo users. In production these come from the auth layer.
    for user_id in 1..=3_i64 {
        sqlx::query("INSERT OR IGNORE INTO users (id, created_at) VALUES (?1, ?2)")
            .bind(user_id)
            .bind(now)
            .execute(db.pool())
            .await?;
    }

    // User 1 gets an address and can check out immediately.
    db.addresses()
        .upsert(1, "JP", "150-0001", "Jingumae 1-2-3", "Hana Sato")
        .await?;

    // An active lottery with a 10-slot allocation of product 9.
    sqlx::query(
        "INSERT INTO lottery_events (title, status, start_at, end_at, created_at) \
         VALUES (?1, 'active', ?2, ?3, ?4)",
    )
    .bind("Launch draw")
    .bind(now - Duration::hours(1))
    .bind(now + Duration::days(7))
    .bind(now)
    .execute(db.pool())
    .await?;

    sqlx::query(
        "INSERT INTO lottery_products (lottery_event_id, product_id, quantity, created_at) \
         VALUES (1, 9, 10, ?1)",
    )
    .bind(now)
    .execute(db.pool())
    .await?;

    // A sealed auction for product 42, minimum bid 5000, no retraction.
    sqlx::query(
        "INSERT INTO auctions (product_id, minimum_bid, is_sealed, allow_bid_retraction, \
         require_payment_info, created_at) VALUES (42, 5000, 1, 0, 0, ?1)",
    )
    .bind(now)
    .execute(db.pool())
    .await?;

    info!("Seed complete: 3 users, 1 address, 1 lottery (10 slots), 1 auction");
    db.close().await;
    Ok(())
}

/// Reads `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
