//! REST routes wrapped in the `{ message, code, data }` envelope.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tracing::error;

use wheel_core::error::IndexerResult;
use wheel_core::models::{PrizeTally, StoredRecord};
use wheel_core::services::QueryService;

/// Response envelope shared by every REST route.
///
/// Success renders `{"message": "Success", "code": 0, "data": ...}` with
/// HTTP 200. Any failure renders `{"message": "Error", "code": 1,
/// "data": null}` with HTTP 500; the cause is only logged.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: &'static str,
    pub code: u8,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            message: "Success",
            code: 0,
            data: Some(data),
        }
    }

    pub fn error() -> Self {
        Self {
            message: "Error",
            code: 1,
            data: None,
        }
    }

    fn status(&self) -> StatusCode {
        if self.code == 0 {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl<T> From<IndexerResult<T>> for ApiResponse<T> {
    fn from(result: IndexerResult<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => {
                error!(error = %e, "❌ Query failed");
                Self::error()
            }
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// REST routes over the query service.
pub fn rest_routes(query: QueryService) -> Router {
    Router::new()
        .route("/events", get(list_records))
        .route("/events/{address}", get(total_contribution))
        .route("/getprize/{address}", get(prize_tally))
        .with_state(query)
}

async fn total_contribution(
    State(query): State<QueryService>,
    Path(address): Path<String>,
) -> ApiResponse<i64> {
    query.total_contribution(&address).await.into()
}

async fn list_records(State(query): State<QueryService>) -> ApiResponse<Vec<StoredRecord>> {
    query.list_records().await.into()
}

async fn prize_tally(
    State(query): State<QueryService>,
    Path(address): Path<String>,
) -> ApiResponse<PrizeTally> {
    query.prize_tally(&address).await.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeStore, sample_records};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use wheel_core::services::QueryConfig;

    fn app(store: FakeStore) -> Router {
        rest_routes(QueryService::new(QueryConfig::default(), Arc::new(store)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_total_contribution_envelope() {
        let (status, body) = get_json(app(FakeStore::new(sample_records())), "/events/0xAaBb").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Success", "code": 0, "data": 150 }));
    }

    #[tokio::test]
    async fn test_unknown_user_gets_zero() {
        let (status, body) = get_json(app(FakeStore::new(sample_records())), "/events/0xcc").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], 0);
    }

    #[tokio::test]
    async fn test_list_records_uses_stored_field_names() {
        let (_, body) = get_json(app(FakeStore::new(sample_records())), "/events").await;

        let records = body["data"].as_array().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(
            records[1],
            json!({
                "txHash": "0x01",
                "index": 1,
                "requestID": 1,
                "user": "0xaabb",
                "type": "response",
                "prize": [2, 9]
            })
        );
    }

    #[tokio::test]
    async fn test_prize_tally_envelope() {
        let (_, body) = get_json(app(FakeStore::new(sample_records())), "/getprize/0xAABB").await;

        assert_eq!(
            body["data"],
            json!({
                "user": "0xaabb",
                "prize": [{ "value": 2, "total": 1 }, { "value": 9, "total": 2 }]
            })
        );
    }

    // Test critique: la cause de l'erreur n'est jamais exposée au client
    #[tokio::test]
    async fn test_failure_envelope_hides_cause() {
        let (status, body) = get_json(app(FakeStore::failing()), "/getprize/0xaabb").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Error", "code": 1, "data": null }));
        assert!(!body.to_string().contains("password"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_timeout_renders_error_envelope() {
        let query = QueryService::new(
            QueryConfig {
                call_timeout: Duration::from_secs(2),
            },
            Arc::new(FakeStore::hanging()),
        );

        let (status, body) = get_json(rest_routes(query), "/events/0xaabb").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Error", "code": 1, "data": null }));
    }
}
