//! PostgreSQL storage adapter.
//!
//! This module implements the `RecordStore` port defined in `wheel-core`
//! using PostgreSQL as the backing store.
//!
//! - [`Database`] - Connection pool and migrations
//! - [`PgRecordStore`] - Insert-if-absent and store-side aggregates
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::for_indexer(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let store = PgRecordStore::new(db.pool().clone());
//! ```

mod database;
mod record_repo;

pub use database::{Database, DatabaseConfig};
pub use record_repo::PgRecordStore;
