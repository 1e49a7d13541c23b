//! Read side: per-user aggregates over stored records.
//!
//! Every query is answered by a single store call, so each result reflects
//! one consistent snapshot even while ingestion is running.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::error::{IndexerResult, StorageError, StorageResult};
use crate::models::{PrizeTally, StoredRecord, canonical_user};
use crate::ports::RecordStore;

/// Configuration for the query engine.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Upper bound on every store call.
    pub call_timeout: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Query engine over an injected record store.
#[derive(Clone)]
pub struct QueryService {
    config: QueryConfig,
    store: Arc<dyn RecordStore>,
}

impl QueryService {
    pub fn new(config: QueryConfig, store: Arc<dyn RecordStore>) -> Self {
        Self { config, store }
    }

    /// Sum of contributions paid by `address`, 0 if it never contributed.
    ///
    /// The address is matched case-insensitively.
    #[instrument(skip(self))]
    pub async fn total_contribution(&self, address: &str) -> IndexerResult<i64> {
        let user = canonical_user(address);
        self.bounded("total_contribution", self.store.total_contribution(&user))
            .await
    }

    /// How many times each prize was drawn for `address`, ascending by prize.
    #[instrument(skip(self))]
    pub async fn prize_tally(&self, address: &str) -> IndexerResult<PrizeTally> {
        let user = canonical_user(address);
        self.bounded("prize_tally", self.store.prize_tally(&user)).await
    }

    /// Every stored record, in insertion order.
    #[instrument(skip(self))]
    pub async fn list_records(&self) -> IndexerResult<Vec<StoredRecord>> {
        self.bounded("find_all", self.store.find_all()).await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StorageResult<T>>,
    ) -> IndexerResult<T> {
        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StorageError::Timeout(operation).into()),
        }
    }
}
