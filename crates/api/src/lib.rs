//! HTTP API for the wheel event indexer.
//!
//! Serves the query engine over two surfaces sharing one router:
//!
//! - REST: `GET /events/{address}`, `GET /events`, `GET /getprize/{address}`,
//!   each wrapped in the `{ message, code, data }` envelope
//! - GraphQL: `/graphql` with `totalContribution`, `prizeTally` and `records`
//!
//! ```ignore
//! use wheel_api::{serve_with_shutdown, ServerConfig};
//!
//! let query = QueryService::new(QueryConfig::default(), store);
//! serve_with_shutdown(query, ServerConfig::default(), shutdown_signal).await?;
//! ```

mod rest;
mod schema;
mod server;

#[cfg(test)]
mod testing;

pub use rest::{ApiResponse, rest_routes};
pub use schema::{
    MAX_QUERY_COMPLEXITY, MAX_QUERY_DEPTH, QueryRoot, WheelSchema, build_schema,
};
pub use server::{ServerConfig, router, serve_with_shutdown};
