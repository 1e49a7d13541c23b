//! Record store double for the serving-layer tests.

use std::collections::BTreeMap;

use async_trait::async_trait;

use wheel_core::error::{StorageError, StorageResult};
use wheel_core::models::{InsertOutcome, PrizeCount, PrizeTally, RecordPayload, StoredRecord};
use wheel_core::ports::RecordStore;

pub struct FakeStore {
    records: Vec<StoredRecord>,
    failing: bool,
    hanging: bool,
}

impl FakeStore {
    pub fn new(records: Vec<StoredRecord>) -> Self {
        Self {
            records,
            failing: false,
            hanging: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            failing: true,
            hanging: false,
        }
    }

    pub fn hanging() -> Self {
        Self {
            records: Vec::new(),
            failing: false,
            hanging: true,
        }
    }

    async fn check(&self) -> StorageResult<()> {
        if self.hanging {
            std::future::pending::<()>().await;
        }
        if self.failing {
            return Err(StorageError::ConnectionError(
                "password authentication failed".into(),
            ));
        }
        Ok(())
    }

    fn of(&self, user: &str) -> impl Iterator<Item = &StoredRecord> {
        self.records.iter().filter(move |r| r.user == user)
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn ensure_unique_index(&self) -> StorageResult<()> {
        self.check().await
    }

    async fn insert_if_absent(&self, _record: &StoredRecord) -> StorageResult<InsertOutcome> {
        self.check().await?;
        Ok(InsertOutcome::Inserted)
    }

    async fn find_all(&self) -> StorageResult<Vec<StoredRecord>> {
        self.check().await?;
        Ok(self.records.clone())
    }

    async fn total_contribution(&self, user: &str) -> StorageResult<i64> {
        self.check().await?;
        Ok(self.of(user).filter_map(StoredRecord::amount).sum())
    }

    async fn prize_tally(&self, user: &str) -> StorageResult<PrizeTally> {
        self.check().await?;
        let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
        for prize in self.of(user).filter_map(StoredRecord::prizes).flatten() {
            *counts.entry(*prize).or_default() += 1;
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

/// Two contributions (100 + 50) and two draws ([2, 9] then [9]) for 0xaabb.
pub fn sample_records() -> Vec<StoredRecord> {
    let record = |tx: &str, index: i64, payload: RecordPayload| StoredRecord {
        tx_hash: tx.to_string(),
        log_index: index,
        request_id: 1,
        user: "0xaabb".to_string(),
        payload,
    };
    vec![
        record("0x01", 0, RecordPayload::Request { amount: 100 }),
        record("0x01", 1, RecordPayload::Response { prize: vec![2, 9] }),
        record("0x02", 0, RecordPayload::Request { amount: 50 }),
        record("0x02", 1, RecordPayload::Response { prize: vec![9] }),
    ]
}
