//! Metrics definitions for the indexer.
//!
//! This module defines all metrics used throughout the indexer.
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

use crate::models::RecordKind;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "logs_fetched_total",
        "Total number of raw logs returned by the log source"
    );
    describe_counter!(
        "records_ingested_total",
        "Total number of records newly written to the store"
    );
    describe_counter!(
        "duplicate_records_total",
        "Total number of inserts skipped because the record already existed"
    );
    describe_counter!(
        "decode_errors_total",
        "Total number of logs that failed decoding or normalization"
    );
    describe_histogram!(
        "ingest_duration_seconds",
        "Time taken by one ingestion call in seconds"
    );
}

/// Record logs returned by one `filter_logs` call.
pub fn record_logs_fetched(count: usize) {
    counter!("logs_fetched_total").increment(count as u64);
}

/// Record a newly inserted record.
pub fn record_record_ingested(kind: RecordKind) {
    counter!("records_ingested_total", "kind" => kind.as_str()).increment(1);
}

/// Record an insert that hit the dedup key.
pub fn record_duplicate() {
    counter!("duplicate_records_total").increment(1);
}

/// Record a decode error.
///
/// # Arguments
/// * `reason` - "malformed" or "overflow"
pub fn record_decode_error(reason: &'static str) {
    counter!("decode_errors_total", "reason" => reason).increment(1);
}

/// Record ingestion duration.
pub fn record_ingest_duration(duration_secs: f64) {
    histogram!("ingest_duration_seconds").record(duration_secs);
}

/// A timer that automatically records duration when dropped.
pub struct IngestTimer {
    start: Instant,
}

impl IngestTimer {
    /// Start a new ingestion timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for IngestTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IngestTimer {
    fn drop(&mut self) {
        record_ingest_duration(self.start.elapsed().as_secs_f64());
    }
}
