//! Domain models for decoded wheel events and stored records.
//!
//! These models are storage-agnostic and represent the canonical
//! form of indexed data within the domain layer.

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

// =============================================================================
// Hex helpers
// =============================================================================

/// Render bytes as a lower-case, 0x-prefixed hex string.
pub fn to_hex_lower(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Canonical form of a user address used as the store key.
///
/// Addresses arrive from URLs in mixed (checksum) case, while stored records
/// always hold the lower-cased form.
pub fn canonical_user(address: &str) -> String {
    address.trim().to_lowercase()
}

// =============================================================================
// Block Range
// =============================================================================

/// Inclusive block range `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    from: u64,
    to: u64,
}

impl BlockRange {
    /// Build a range, rejecting `from > to`.
    pub fn new(from: u64, to: u64) -> DomainResult<Self> {
        if from > to {
            return Err(DomainError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// First block (inclusive).
    pub fn start(&self) -> u64 {
        self.from
    }

    /// Last block (inclusive).
    pub fn end(&self) -> u64 {
        self.to
    }

    /// Number of blocks covered (both ends included).
    pub fn block_count(&self) -> u64 {
        self.to - self.from + 1
    }

    /// Split into consecutive windows of at most `size` blocks.
    ///
    /// A `size` of zero yields the whole range as a single window.
    pub fn chunks(&self, size: u64) -> Vec<BlockRange> {
        if size == 0 {
            return vec![*self];
        }

        let mut windows = Vec::new();
        let mut start = self.from;
        loop {
            let end = start.saturating_add(size - 1).min(self.to);
            windows.push(BlockRange {
                from: start,
                to: end,
            });
            if end == self.to {
                break;
            }
            start = end + 1;
        }
        windows
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}

// =============================================================================
// Decoded Events
// =============================================================================

/// `RequestCreated(address,uint256,uint256)`: a user paid into the wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub user: Address,
    pub request_id: U256,
    pub amount: U256,
    pub tx_hash: B256,
    pub log_index: u64,
}

/// `ResponseCreated(address,uint256,uint256[])`: prizes drawn for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeDraw {
    pub user: Address,
    pub request_id: U256,
    /// Prize identifiers, in payload order, after header trimming.
    pub prizes: Vec<U256>,
    pub tx_hash: B256,
    pub log_index: u64,
}

/// A log entry recognized as one of the two wheel events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    Contribution(Contribution),
    PrizeDraw(PrizeDraw),
}

impl DecodedEvent {
    pub fn tx_hash(&self) -> B256 {
        match self {
            DecodedEvent::Contribution(c) => c.tx_hash,
            DecodedEvent::PrizeDraw(p) => p.tx_hash,
        }
    }

    pub fn log_index(&self) -> u64 {
        match self {
            DecodedEvent::Contribution(c) => c.log_index,
            DecodedEvent::PrizeDraw(p) => p.log_index,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            DecodedEvent::Contribution(_) => RecordKind::Request,
            DecodedEvent::PrizeDraw(_) => RecordKind::Response,
        }
    }
}

// =============================================================================
// Stored Records
// =============================================================================

/// Discriminant of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Request,
    Response,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Request => "request",
            RecordKind::Response => "response",
        }
    }

    /// Parse the persisted discriminant.
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "request" => Ok(RecordKind::Request),
            "response" => Ok(RecordKind::Response),
            other => Err(DomainError::InvalidRecord(format!(
                "unknown record kind '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific part of a stored record.
///
/// Serialized inline with the record under a `type` tag, so a record renders
/// as `{"type": "request", "amount": 100, ...}` or
/// `{"type": "response", "prize": [2, 9], ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordPayload {
    Request { amount: i64 },
    Response { prize: Vec<i64> },
}

/// The persisted, queryable unit.
///
/// `(tx_hash, log_index)` is the dedup key. Records are created once by the
/// ingestion driver and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Lower-case 0x-prefixed transaction hash.
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    /// Log index within the block.
    #[serde(rename = "index")]
    pub log_index: i64,
    #[serde(rename = "requestID")]
    pub request_id: i64,
    /// Lower-case 0x-prefixed user address.
    pub user: String,
    #[serde(flatten)]
    pub payload: RecordPayload,
}

impl StoredRecord {
    pub fn kind(&self) -> RecordKind {
        match self.payload {
            RecordPayload::Request { .. } => RecordKind::Request,
            RecordPayload::Response { .. } => RecordKind::Response,
        }
    }

    /// Contribution amount, for `request` records.
    pub fn amount(&self) -> Option<i64> {
        match self.payload {
            RecordPayload::Request { amount } => Some(amount),
            RecordPayload::Response { .. } => None,
        }
    }

    /// Prize identifiers, for `response` records.
    pub fn prizes(&self) -> Option<&[i64]> {
        match &self.payload {
            RecordPayload::Request { .. } => None,
            RecordPayload::Response { prize } => Some(prize),
        }
    }
}

/// Outcome of an insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same dedup key already exists.
    Duplicate,
}

// =============================================================================
// Query Results
// =============================================================================

/// Occurrences of one prize identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeCount {
    /// Prize identifier.
    pub value: i64,
    /// Number of times it was drawn.
    pub total: i64,
}

/// Per-user prize histogram, ascending by prize identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeTally {
    pub user: String,
    pub prize: Vec<PrizeCount>,
}

impl PrizeTally {
    pub fn empty(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            prize: Vec::new(),
        }
    }

    /// Total number of prize occurrences across all groups.
    pub fn occurrences(&self) -> i64 {
        self.prize.iter().map(|p| p.total).sum()
    }
}

// =============================================================================
// Tests
// =============================================================================
