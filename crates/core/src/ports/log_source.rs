//! Port trait for the upstream log source.
//!
//! This trait defines the interface for fetching contract logs over a
//! block range. Implementations live in the infrastructure layer
//! (e.g., `wheel-evm`).

use alloy_primitives::{Address, B256, Bytes};
use async_trait::async_trait;

use crate::error::ChainResult;
use crate::models::BlockRange;

/// Raw log entry before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    /// Indexed topics; `topics[0]` is the event signature hash.
    pub topics: Vec<B256>,
    /// Opaque ABI-encoded payload.
    pub data: Bytes,
    /// Hash of the emitting transaction.
    pub tx_hash: B256,
    /// Position of the log in its block.
    pub log_index: u64,
    /// Block that contains the log (diagnostics only).
    pub block_number: Option<u64>,
}

/// Port trait for the log source.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch all logs emitted by `address` within `range` (bounds inclusive),
    /// in chain order.
    async fn filter_logs(&self, address: Address, range: BlockRange) -> ChainResult<Vec<RawLog>>;

    /// Latest block number known to the source.
    async fn latest_block(&self) -> ChainResult<u64>;
}
