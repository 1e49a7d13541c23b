//! Error types for the indexer domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`DomainError`] - Decoding, normalization and input validation errors
//! - [`StorageError`] - Record store errors
//! - [`ChainError`] - Log source (JSON-RPC) errors
//! - [`IndexerError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Domain Errors
// =============================================================================

/// Business logic and domain rule violations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Block range with `from > to`.
    #[error("Invalid block range: from {from} is greater than to {to}")]
    InvalidRange {
        /// First block of the requested range.
        from: u64,
        /// Last block of the requested range.
        to: u64,
    },

    /// A decoded value does not fit the storage integer width.
    ///
    /// Silent truncation would corrupt contribution totals and prize
    /// tallies, so the offending record is reported instead.
    #[error("Value {value} of field '{field}' overflows i64 (tx {tx_hash}, log {log_index})")]
    RangeOverflow {
        /// Field that failed to narrow (e.g. "amount", "prize[1]").
        field: String,
        /// Offending value: decimal when it fits 256 bits, `0x` hex of its
        /// significant bytes when it does not.
        value: String,
        /// Transaction hash of the source log.
        tx_hash: String,
        /// Log index of the source log.
        log_index: u64,
    },

    /// A log matched a known signature but has the wrong shape.
    #[error("Malformed log: {0}")]
    MalformedLog(String),

    /// A stored record violates the closed record schema.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl DomainError {
    /// Whether this error must abort the ingestion batch.
    ///
    /// Only overflows escalate; a malformed entry is skipped.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DomainError::MalformedLog(_))
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Record store errors.
///
/// These errors originate from storage operations like queries,
/// migrations, and row decoding.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// SQL query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// A row could not be mapped into the record schema.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The store did not answer within the call timeout.
    #[error("Store operation '{0}' timed out")]
    Timeout(&'static str),
}

// =============================================================================
// Chain Errors
// =============================================================================

/// Log source (JSON-RPC) errors.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Endpoint URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// RPC request failed.
    #[error("RPC error: {0}")]
    RpcError(String),

    /// Node returned a log without the fields needed for deduplication.
    #[error("Invalid log returned by node: {0}")]
    InvalidLog(String),

    /// Request did not complete within the call timeout.
    #[error("Log source request timed out")]
    Timeout,
}

// =============================================================================
// Indexer Errors
// =============================================================================

/// Top-level orchestration errors.
///
/// This is the error type returned by the ingestion and query services.
/// It wraps all lower-level errors and adds orchestration variants.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Domain logic error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The log source is unreachable or erroring.
    #[error("Log source unavailable: {0}")]
    SourceUnavailable(#[from] ChainError),

    /// The record store is unreachable or erroring.
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),

    /// Graceful shutdown was requested.
    ///
    /// This is not really an error but uses the error type for control flow.
    #[error("Shutdown requested")]
    ShutdownRequested,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for indexer operations.
pub type IndexerResult<T> = Result<T, IndexerError>;

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
