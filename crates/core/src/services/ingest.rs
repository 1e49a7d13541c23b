//! Ingestion driver - pulls contract logs for a block range into the store.
//!
//! One call covers one inclusive range. Entries are processed sequentially,
//! in the order the source returns them, and every insert is
//! insert-if-absent, so re-running a range (or an overlapping one) never
//! duplicates a record.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::{ChainError, IndexerError, IndexerResult, StorageError};
use crate::metrics::{
    IngestTimer, record_decode_error, record_duplicate, record_logs_fetched,
    record_record_ingested,
};
use crate::models::{BlockRange, InsertOutcome, to_hex_lower};
use crate::ports::{LogSource, RecordStore};
use crate::services::{EventDecoder, normalize};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the ingestion driver.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Contract whose logs are ingested.
    pub contract: Address,
    /// Upper bound on every source or store call.
    pub call_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            contract: Address::ZERO,
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Counters for one ingestion call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Logs returned by the source.
    pub fetched: usize,
    /// Records newly written.
    pub inserted: usize,
    /// Records already present.
    pub duplicates: usize,
    /// Logs that are not wheel events.
    pub skipped: usize,
    /// Recognized logs with an unusable shape.
    pub malformed: usize,
}

impl IngestReport {
    /// Fold another window's counters into this one.
    pub fn merge(&mut self, other: IngestReport) {
        self.fetched += other.fetched;
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.skipped += other.skipped;
        self.malformed += other.malformed;
    }
}

// =============================================================================
// IngestService
// =============================================================================

/// Ingestion driver over an injected log source and record store.
///
/// # Flow
///
/// 1. Ensure the `(tx_hash, log_index)` unique index exists
/// 2. Fetch all contract logs in the range
/// 3. Decode each log, skipping unrelated ones
/// 4. Normalize and insert-if-absent
///
/// A store failure or a value overflow aborts the call. Records written
/// before the failure stay valid and the next run resumes over them.
pub struct IngestService<S: LogSource + ?Sized, R: RecordStore + ?Sized> {
    config: IngestConfig,
    source: Arc<S>,
    store: Arc<R>,
    decoder: EventDecoder,
}

impl<S: LogSource + ?Sized, R: RecordStore + ?Sized> IngestService<S, R> {
    pub fn new(config: IngestConfig, source: Arc<S>, store: Arc<R>) -> Self {
        Self {
            config,
            source,
            store,
            decoder: EventDecoder::new(),
        }
    }

    /// Latest block known to the source, bounded by the call timeout.
    pub async fn latest_block(&self, shutdown: &mut watch::Receiver<bool>) -> IndexerResult<u64> {
        self.bounded(shutdown, self.source.latest_block(), || ChainError::Timeout)
            .await
    }

    /// Validate `from..=to`, then ingest it.
    ///
    /// An inverted range fails with `DomainError::InvalidRange` before any
    /// call reaches the source or the store.
    pub async fn ingest_between(
        &self,
        from: u64,
        to: u64,
        shutdown: &mut watch::Receiver<bool>,
    ) -> IndexerResult<IngestReport> {
        let range = BlockRange::new(from, to)?;
        self.ingest(range, shutdown).await
    }

    /// Ingest every wheel event emitted by the contract within `range`.
    #[instrument(skip_all, fields(range = %range))]
    pub async fn ingest(
        &self,
        range: BlockRange,
        shutdown: &mut watch::Receiver<bool>,
    ) -> IndexerResult<IngestReport> {
        let _timer = IngestTimer::new();
        let mut report = IngestReport::default();

        self.bounded(shutdown, self.store.ensure_unique_index(), || {
            StorageError::Timeout("ensure_unique_index")
        })
        .await?;

        let logs = self
            .bounded(
                shutdown,
                self.source.filter_logs(self.config.contract, range),
                || ChainError::Timeout,
            )
            .await?;
        report.fetched = logs.len();
        record_logs_fetched(logs.len());
        debug!(logs = logs.len(), "Logs fetched");

        for log in &logs {
            if *shutdown.borrow() {
                debug!("Shutdown requested");
                return Err(IndexerError::ShutdownRequested);
            }

            let event = match self.decoder.decode(log) {
                Ok(Some(event)) => event,
                Ok(None) => {
                    trace!(log = log.log_index, "Not a wheel event, skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(e) if !e.is_fatal() => {
                    warn!(
                        tx = %to_hex_lower(log.tx_hash),
                        log = log.log_index,
                        error = %e,
                        "⚠️  Malformed log skipped"
                    );
                    record_decode_error("malformed");
                    report.malformed += 1;
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "❌ Log decoding failed");
                    record_decode_error("overflow");
                    return Err(e.into());
                }
            };

            let record = normalize(event).inspect_err(|e| {
                error!(error = %e, "❌ Record normalization failed");
                record_decode_error("overflow");
            })?;

            let outcome = self
                .bounded(shutdown, self.store.insert_if_absent(&record), || {
                    StorageError::Timeout("insert_if_absent")
                })
                .await?;

            match outcome {
                InsertOutcome::Inserted => {
                    record_record_ingested(record.kind());
                    report.inserted += 1;
                }
                InsertOutcome::Duplicate => {
                    trace!(tx = %record.tx_hash, log = record.log_index, "Already stored");
                    record_duplicate();
                    report.duplicates += 1;
                }
            }
        }

        info!(
            fetched = report.fetched,
            inserted = report.inserted,
            duplicates = report.duplicates,
            skipped = report.skipped,
            malformed = report.malformed,
            "📥 Range ingested"
        );
        Ok(report)
    }

    /// Run one port call under the call timeout, giving up early on shutdown.
    async fn bounded<T, E>(
        &self,
        shutdown: &mut watch::Receiver<bool>,
        call: impl Future<Output = Result<T, E>>,
        on_timeout: impl FnOnce() -> E,
    ) -> IndexerResult<T>
    where
        E: Into<IndexerError>,
    {
        tokio::select! {
            biased;
            _ = shutdown_requested(shutdown) => Err(IndexerError::ShutdownRequested),
            result = tokio::time::timeout(self.config.call_timeout, call) => match result {
                Ok(inner) => inner.map_err(Into::into),
                Err(_) => Err(on_timeout().into()),
            },
        }
    }
}

/// Resolves once shutdown is signalled. Never resolves if the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let closed = shutdown.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
