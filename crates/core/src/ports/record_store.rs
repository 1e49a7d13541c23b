//! Port trait for the record store.
//!
//! The store owns the `(tx_hash, log_index)` uniqueness constraint and
//! computes aggregates on its side. Implementations live in the
//! infrastructure layer (e.g., `wheel-storage`).

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::{InsertOutcome, PrizeTally, StoredRecord};

/// Repository for stored wheel records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the `(tx_hash, log_index)` unique index if it does not exist.
    ///
    /// Safe to call repeatedly.
    async fn ensure_unique_index(&self) -> StorageResult<()>;

    /// Insert a record unless one with the same dedup key exists.
    async fn insert_if_absent(&self, record: &StoredRecord) -> StorageResult<InsertOutcome>;

    /// All records, in insertion order.
    async fn find_all(&self) -> StorageResult<Vec<StoredRecord>>;

    /// Sum of `amount` over `request` records of `user` (0 when none).
    ///
    /// `user` is already in canonical lower-case form.
    async fn total_contribution(&self, user: &str) -> StorageResult<i64>;

    /// Prize histogram over `response` records of `user`, ascending by prize.
    ///
    /// `user` is already in canonical lower-case form.
    async fn prize_tally(&self, user: &str) -> StorageResult<PrizeTally>;
}
