//! Storage layer for the wheel event indexer.
//!
//! This crate provides the PostgreSQL implementation of the `RecordStore`
//! trait defined in `wheel-core`: connection pooling, migrations, the
//! `(tx_hash, log_index)` dedup index and the per-user aggregates.
//!
//! # Usage
//!
//! ```ignore
//! use wheel_storage::{Database, DatabaseConfig, PgRecordStore};
//!
//! // Connect to the database
//! let config = DatabaseConfig::for_indexer(&database_url);
//! let db = Database::connect(&config).await?;
//!
//! // Run migrations
//! db.migrate().await?;
//!
//! let store = Arc::new(PgRecordStore::new(db.pool().clone()));
//! ```

pub mod postgres;

pub use postgres::{Database, DatabaseConfig, PgRecordStore};
