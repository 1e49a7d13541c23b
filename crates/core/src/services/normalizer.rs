//! Record normalizer: decoded events to storage-ready records.

use alloy_primitives::U256;

use crate::error::{DomainError, DomainResult};
use crate::models::{DecodedEvent, RecordPayload, StoredRecord, to_hex_lower};

/// Largest value representable in the storage integer width.
const I64_MAX: U256 = U256::from_limbs([i64::MAX as u64, 0, 0, 0]);

/// Convert a decoded event into its canonical stored form.
///
/// Every numeric field is narrowed to `i64` with a checked conversion; a
/// value that does not fit fails with [`DomainError::RangeOverflow`].
pub fn normalize(event: DecodedEvent) -> DomainResult<StoredRecord> {
    let narrow = Narrower {
        tx_hash: to_hex_lower(event.tx_hash()),
        log_index: event.log_index(),
    };

    let log_index = narrow.index()?;

    let record = match event {
        DecodedEvent::Contribution(c) => StoredRecord {
            request_id: narrow.uint("requestID", c.request_id)?,
            user: to_hex_lower(c.user),
            payload: RecordPayload::Request {
                amount: narrow.uint("amount", c.amount)?,
            },
            tx_hash: narrow.tx_hash,
            log_index,
        },
        DecodedEvent::PrizeDraw(p) => {
            let prize = p
                .prizes
                .iter()
                .enumerate()
                .map(|(i, value)| narrow.uint(&format!("prize[{}]", i), *value))
                .collect::<DomainResult<Vec<_>>>()?;

            StoredRecord {
                request_id: narrow.uint("requestID", p.request_id)?,
                user: to_hex_lower(p.user),
                payload: RecordPayload::Response { prize },
                tx_hash: narrow.tx_hash,
                log_index,
            }
        }
    };

    Ok(record)
}

/// Checked narrowing that names the source log on failure.
struct Narrower {
    tx_hash: String,
    log_index: u64,
}

impl Narrower {
    fn uint(&self, field: &str, value: U256) -> DomainResult<i64> {
        if value > I64_MAX {
            return Err(self.overflow(field, value.to_string()));
        }
        Ok(value.as_limbs()[0] as i64)
    }

    fn index(&self) -> DomainResult<i64> {
        i64::try_from(self.log_index)
            .map_err(|_| self.overflow("index", self.log_index.to_string()))
    }

    fn overflow(&self, field: &str, value: String) -> DomainError {
        DomainError::RangeOverflow {
            field: field.to_string(),
            value,
            tx_hash: self.tx_hash.clone(),
            log_index: self.log_index,
        }
    }
}
