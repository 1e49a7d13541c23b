//! In-memory port implementations shared by the service tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;

use crate::error::{ChainError, ChainResult, StorageError, StorageResult};
use crate::models::{BlockRange, InsertOutcome, PrizeCount, PrizeTally, StoredRecord};
use crate::ports::{LogSource, RawLog, RecordStore};
use crate::services::EventDecoder;

// =============================================================================
// Log source
// =============================================================================

#[derive(Default)]
pub struct StaticLogSource {
    logs: Vec<RawLog>,
    calls: AtomicUsize,
    /// Never answer, to exercise timeouts and cancellation.
    hang: bool,
    fail: bool,
}

impl StaticLogSource {
    pub fn new(logs: Vec<RawLog>) -> Self {
        Self {
            logs,
            ..Default::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogSource for StaticLogSource {
    async fn filter_logs(&self, _address: Address, range: BlockRange) -> ChainResult<Vec<RawLog>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(ChainError::RpcError("node unreachable".into()));
        }
        Ok(self
            .logs
            .iter()
            .filter(|log| {
                log.block_number
                    .is_none_or(|n| n >= range.start() && n <= range.end())
            })
            .cloned()
            .collect())
    }

    async fn latest_block(&self) -> ChainResult<u64> {
        Ok(self
            .logs
            .iter()
            .filter_map(|log| log.block_number)
            .max()
            .unwrap_or(0))
    }
}

// =============================================================================
// Record store
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<StoredRecord>>,
    pub index_calls: AtomicUsize,
    /// Fail every insert after this many successful ones.
    pub fail_after: Option<usize>,
    pub down: AtomicBool,
    /// Never answer, to exercise query timeouts.
    hang: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StoredRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn failing_after(inserts: usize) -> Self {
        Self {
            fail_after: Some(inserts),
            ..Default::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Default::default()
        }
    }

    pub fn records(&self) -> Vec<StoredRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    async fn check_up(&self) -> StorageResult<()> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.down.load(Ordering::SeqCst) {
            return Err(StorageError::ConnectionError("store is down".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ensure_unique_index(&self) -> StorageResult<()> {
        self.check_up().await?;
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn insert_if_absent(&self, record: &StoredRecord) -> StorageResult<InsertOutcome> {
        self.check_up().await?;
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.tx_hash == record.tx_hash && r.log_index == record.log_index)
        {
            return Ok(InsertOutcome::Duplicate);
        }
        if self.fail_after.is_some_and(|limit| records.len() >= limit) {
            return Err(StorageError::QueryError("disk full".into()));
        }
        records.push(record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find_all(&self) -> StorageResult<Vec<StoredRecord>> {
        self.check_up().await?;
        Ok(self.records())
    }

    async fn total_contribution(&self, user: &str) -> StorageResult<i64> {
        self.check_up().await?;
        Ok(self
            .records()
            .iter()
            .filter(|r| r.user == user)
            .filter_map(StoredRecord::amount)
            .sum())
    }

    async fn prize_tally(&self, user: &str) -> StorageResult<PrizeTally> {
        self.check_up().await?;
        let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
        for record in self.records().iter().filter(|r| r.user == user) {
            for prize in record.prizes().unwrap_or_default() {
                *counts.entry(*prize).or_default() += 1;
            }
        }
        Ok(PrizeTally {
            user: user.to_string(),
            prize: counts
                .into_iter()
                .map(|(value, total)| PrizeCount { value, total })
                .collect(),
        })
    }
}

// =============================================================================
// Log builders
// =============================================================================

pub fn user_topic(last: u8) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[31] = last;
    B256::from(bytes)
}

pub fn user_address(last: u8) -> String {
    crate::models::to_hex_lower(Address::from_word(user_topic(last)))
}

fn word(value: u64) -> [u8; 32] {
    U256::from(value).to_be_bytes::<32>()
}

pub fn contribution_log(tx: u8, index: u64, block: u64, user: u8, amount: u64) -> RawLog {
    RawLog {
        topics: vec![
            EventDecoder::new().contribution_topic(),
            user_topic(user),
            B256::from(word(index + 1)),
        ],
        data: Bytes::from(word(amount).to_vec()),
        tx_hash: B256::repeat_byte(tx),
        log_index: index,
        block_number: Some(block),
    }
}

pub fn prize_draw_log(tx: u8, index: u64, block: u64, user: u8, prizes: &[u64]) -> RawLog {
    let mut data: Vec<u8> = word(32).into_iter().chain(word(prizes.len() as u64)).collect();
    for prize in prizes {
        data.extend_from_slice(&word(*prize));
    }
    RawLog {
        topics: vec![
            EventDecoder::new().prize_draw_topic(),
            user_topic(user),
            B256::from(word(index + 1)),
        ],
        data: Bytes::from(data),
        tx_hash: B256::repeat_byte(tx),
        log_index: index,
        block_number: Some(block),
    }
}
