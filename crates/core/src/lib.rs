//! Core domain layer for the wheel event indexer.
//!
//! This crate contains the domain models, port traits (interfaces), and
//! business logic services for indexing the wheel contract's events. It
//! follows hexagonal architecture principles - this is the innermost layer
//! with no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      wheel (binary)                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │        wheel-api          │           wheel-evm             │
//! │   (REST + GraphQL)        │      (JSON-RPC logs)            │
//! ├───────────────────────────┴─────────────────────────────────┤
//! │                     wheel-storage                           │
//! │                      (PostgreSQL)                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      wheel-core  ← YOU ARE HERE             │
//! │               (models, ports, services)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (BlockRange, DecodedEvent, StoredRecord, etc.)
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - Decoder, normalizer, ingestion driver and query engine
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Key Concepts
//!
//! ## Ports
//!
//! - [`ports::LogSource`] - Fetch contract logs over a block range
//! - [`ports::RecordStore`] - Persist records and answer aggregates
//!
//! ## Ingestion
//!
//! 1. Ensure the dedup index exists
//! 2. Fetch the range's logs from the source
//! 3. Decode `RequestCreated` / `ResponseCreated`, skip the rest
//! 4. Normalize to [`models::StoredRecord`] with checked narrowing
//! 5. Insert-if-absent on `(tx_hash, log_index)`

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;
