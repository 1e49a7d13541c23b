//! Record store implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use wheel_core::error::{StorageError, StorageResult};
use wheel_core::models::{
    InsertOutcome, PrizeCount, PrizeTally, RecordKind, RecordPayload, StoredRecord,
};
use wheel_core::ports::RecordStore;

// =============================================================================
// Repository Implementation
// =============================================================================

/// PostgreSQL implementation of RecordStore.
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    #[instrument(skip(self))]
    async fn ensure_unique_index(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS wheel_records_tx_log_key
                ON wheel_records (tx_hash, log_index)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        debug!("Unique index on (tx_hash, log_index) present");
        Ok(())
    }

    async fn insert_if_absent(&self, record: &StoredRecord) -> StorageResult<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO wheel_records (
                tx_hash, log_index, kind, request_id, user_address, amount, prize
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tx_hash, log_index) DO NOTHING
            "#,
        )
        .bind(&record.tx_hash)
        .bind(record.log_index)
        .bind(record.kind().as_str())
        .bind(record.request_id)
        .bind(&record.user)
        .bind(record.amount())
        .bind(record.prizes().map(<[i64]>::to_vec))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn find_all(&self) -> StorageResult<Vec<StoredRecord>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT tx_hash, log_index, kind, request_id, user_address, amount, prize
            FROM wheel_records
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }

    async fn total_contribution(&self, user: &str) -> StorageResult<i64> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount), 0)::BIGINT
            FROM wheel_records
            WHERE user_address = $1 AND kind = 'request'
            "#,
        )
        .bind(user)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(total)
    }

    async fn prize_tally(&self, user: &str) -> StorageResult<PrizeTally> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT p AS value, COUNT(*)::BIGINT AS total
            FROM wheel_records, unnest(prize) AS p
            WHERE user_address = $1 AND kind = 'response'
            GROUP BY p
            ORDER BY p ASC
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(PrizeTally {
            user: user.to_string(),
            prize: rows
                .into_iter()
                .map(|(value, total)| PrizeCount { value, total })
                .collect(),
        })
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(sqlx::FromRow)]
struct RecordRow {
    tx_hash: String,
    log_index: i64,
    kind: String,
    request_id: i64,
    user_address: String,
    amount: Option<i64>,
    prize: Option<Vec<i64>>,
}

impl RecordRow {
    fn into_record(self) -> StorageResult<StoredRecord> {
        let kind = RecordKind::parse(&self.kind)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let payload = match (kind, self.amount, self.prize) {
            (RecordKind::Request, Some(amount), None) => RecordPayload::Request { amount },
            (RecordKind::Response, None, Some(prize)) => RecordPayload::Response { prize },
            _ => {
                return Err(StorageError::SerializationError(format!(
                    "record {}:{} has a payload that does not match kind '{}'",
                    self.tx_hash, self.log_index, kind
                )));
            }
        };

        Ok(StoredRecord {
            tx_hash: self.tx_hash,
            log_index: self.log_index,
            request_id: self.request_id,
            user: self.user_address,
            payload,
        })
    }
}
