//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← categorized; UNIQUE violations keep the        │
//! │       │                  violated constraint name                       │
//! │       ▼                                                                 │
//! │  relic-commerce maps the constraint to the operation's error:           │
//! │       paypay_payments.merchant_payment_id  → DuplicatePayment           │
//! │       lottery_entries.(user, product)      → DuplicateEntry             │
//! │       sealed_bids.(auction, user)          → DuplicateBid               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keeping the constraint name matters: the scarcity rules are enforced by
//! UNIQUE indexes rather than application checks, so the index name is the
//! only way to tell *which* rule a racing request lost against.

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// `constraint` is the column list SQLite reports, e.g.
    /// `paypay_payments.merchant_payment_id`.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Entry referencing a lottery event that was deleted
    /// - Bid referencing an unknown auction
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Commit or rollback failed.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Whether this error is a UNIQUE violation on the given table or
    /// column. Services use this to turn a lost race into the right
    /// "already done" error.
    pub fn is_unique_violation_on(&self, table_or_column: &str) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { constraint } if constraint.contains(table_or_column)
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                //   UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>[, ...]"
                //   FK constraint:     "FOREIGN KEY constraint failed"
                if let Some(constraint) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        constraint: constraint.to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_matching() {
        let err = DbError::UniqueViolation {
            constraint: "paypay_payments.merchant_payment_id".to_string(),
        };
        assert!(err.is_unique_violation_on("paypay_payments"));
        assert!(err.is_unique_violation_on("merchant_payment_id"));
        assert!(!err.is_unique_violation_on("lottery_entries"));

        let err = DbError::not_found("Shipment", "s-1");
        assert!(!err.is_unique_violation_on("paypay_payments"));
    }
}
