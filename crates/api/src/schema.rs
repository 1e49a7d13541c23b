//! GraphQL schema definition.
//!
//! Exposes the same three reads as the REST routes: per-user contribution
//! total, per-user prize tally, and the full record list.

use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Result, Schema};
use tracing::error;

use wheel_core::error::IndexerError;
use wheel_core::models::RecordKind;
use wheel_core::services::QueryService;

// -----------------------------------------------------------------------------
// Schema Configuration
// -----------------------------------------------------------------------------

/// Maximum query depth to prevent deeply nested queries (DoS protection).
/// Note: GraphQL introspection requires depth ~13, so we use 15 to allow it.
pub const MAX_QUERY_DEPTH: usize = 15;

/// Maximum query complexity score (DoS protection).
pub const MAX_QUERY_COMPLEXITY: usize = 500;

/// The wheel GraphQL schema type.
pub type WheelSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// Build the schema over a query service, with depth and complexity limits.
pub fn build_schema(query: QueryService) -> WheelSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(query)
        .limit_depth(MAX_QUERY_DEPTH)
        .limit_complexity(MAX_QUERY_COMPLEXITY)
        .finish()
}

// -----------------------------------------------------------------------------
// Query Root
// -----------------------------------------------------------------------------

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Sum of all contributions paid by an address (0 if none).
    async fn total_contribution<'ctx>(&self, ctx: &Context<'ctx>, address: String) -> Result<i64> {
        validate_address(&address)?;
        let query = ctx.data::<QueryService>()?;

        query
            .total_contribution(&address)
            .await
            .map_err(query_failed)
    }

    /// How many times each prize was drawn for an address.
    async fn prize_tally<'ctx>(&self, ctx: &Context<'ctx>, address: String) -> Result<PrizeTally> {
        validate_address(&address)?;
        let query = ctx.data::<QueryService>()?;

        let tally = query.prize_tally(&address).await.map_err(query_failed)?;
        Ok(PrizeTally::from(tally))
    }

    /// Every stored record, in insertion order.
    async fn records<'ctx>(&self, ctx: &Context<'ctx>) -> Result<Vec<Record>> {
        let query = ctx.data::<QueryService>()?;

        let records = query.list_records().await.map_err(query_failed)?;
        Ok(records.into_iter().map(Record::from).collect())
    }
}

/// Log a failed read and hand the client a cause-free error.
fn query_failed(err: IndexerError) -> async_graphql::Error {
    error!(error = %err, "GraphQL query failed");
    async_graphql::Error::new("Error")
}

// -----------------------------------------------------------------------------
// GraphQL Types
// -----------------------------------------------------------------------------

/// A stored wheel record.
#[derive(async_graphql::SimpleObject)]
pub struct Record {
    pub tx_hash: String,
    pub index: i64,
    /// "request" or "response".
    pub kind: String,
    pub request_id: i64,
    pub user: String,
    /// Set on request records.
    pub amount: Option<i64>,
    /// Set on response records.
    pub prize: Option<Vec<i64>>,
}

impl From<wheel_core::models::StoredRecord> for Record {
    fn from(r: wheel_core::models::StoredRecord) -> Self {
        let kind: RecordKind = r.kind();
        Self {
            amount: r.amount(),
            prize: r.prizes().map(<[i64]>::to_vec),
            kind: kind.to_string(),
            tx_hash: r.tx_hash,
            index: r.log_index,
            request_id: r.request_id,
            user: r.user,
        }
    }
}

#[derive(async_graphql::SimpleObject)]
pub struct PrizeCount {
    pub value: i64,
    pub total: i64,
}

#[derive(async_graphql::SimpleObject)]
pub struct PrizeTally {
    pub user: String,
    pub prize: Vec<PrizeCount>,
}

impl From<wheel_core::models::PrizeTally> for PrizeTally {
    fn from(t: wheel_core::models::PrizeTally) -> Self {
        Self {
            user: t.user,
            prize: t
                .prize
                .into_iter()
                .map(|p| PrizeCount {
                    value: p.value,
                    total: p.total,
                })
                .collect(),
        }
    }
}

// -----------------------------------------------------------------------------
// Validation
// -----------------------------------------------------------------------------

/// Maximum length for address arguments.
const MAX_ADDRESS_LENGTH: usize = 128;

fn validate_address(address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(async_graphql::Error::new("address cannot be empty"));
    }
    if address.len() > MAX_ADDRESS_LENGTH {
        return Err(async_graphql::Error::new(format!(
            "address too long: maximum {} characters allowed",
            MAX_ADDRESS_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeStore, sample_records};
    use serde_json::json;
    use std::sync::Arc;
    use wheel_core::services::QueryConfig;

    fn schema() -> WheelSchema {
        build_schema(QueryService::new(
            QueryConfig::default(),
            Arc::new(FakeStore::new(sample_records())),
        ))
    }

    #[tokio::test]
    async fn test_total_contribution_query() {
        let res = schema()
            .execute(r#"{ totalContribution(address: "0xAABB") }"#)
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(
            res.data.into_json().unwrap(),
            json!({ "totalContribution": 150 })
        );
    }

    #[tokio::test]
    async fn test_prize_tally_query() {
        let res = schema()
            .execute(r#"{ prizeTally(address: "0xaabb") { user prize { value total } } }"#)
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert_eq!(
            res.data.into_json().unwrap(),
            json!({
                "prizeTally": {
                    "user": "0xaabb",
                    "prize": [{ "value": 2, "total": 1 }, { "value": 9, "total": 2 }]
                }
            })
        );
    }

    #[tokio::test]
    async fn test_records_query() {
        let res = schema()
            .execute("{ records { txHash index kind requestId amount prize } }")
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        let data = res.data.into_json().unwrap();
        assert_eq!(data["records"].as_array().unwrap().len(), 4);
        assert_eq!(data["records"][0]["kind"], "request");
        assert_eq!(data["records"][1]["prize"], json!([2, 9]));
        assert_eq!(data["records"][1]["amount"], json!(null));
    }

    // Tests de validation critiques - protègent contre les entrées abusives
    #[test]
    fn test_validate_address_boundaries() {
        assert!(validate_address("").is_err());
        assert!(validate_address(&"a".repeat(200)).is_err());
        assert!(validate_address("0xaabb").is_ok());
    }

    // Test critique: la cause de l'erreur reste dans les logs, jamais dans la réponse
    #[tokio::test]
    async fn test_store_failure_hides_cause() {
        let schema = build_schema(QueryService::new(
            QueryConfig::default(),
            Arc::new(FakeStore::failing()),
        ));

        for query in [
            r#"{ totalContribution(address: "0xaa") }"#,
            r#"{ prizeTally(address: "0xaa") { user } }"#,
            "{ records { txHash } }",
        ] {
            let res = schema.execute(query).await;
            let messages: Vec<_> = res.errors.iter().map(|e| e.message.as_str()).collect();
            assert_eq!(messages, vec!["Error"], "{query}");
        }
    }
}
