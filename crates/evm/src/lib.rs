//! EVM JSON-RPC adapter for the wheel event indexer.
//!
//! This crate implements the [`LogSource`] port from `wheel-core` on top of
//! an alloy HTTP provider. Logs are fetched with a single `eth_getLogs`
//! call per block range, filtered on the contract address.
//!
//! # Usage
//!
//! ```ignore
//! use wheel_evm::{EvmClientConfig, EvmLogClient};
//!
//! let config = EvmClientConfig {
//!     rpc_url: "https://eth.llamarpc.com".to_string(),
//! };
//!
//! let client = EvmLogClient::connect(&config).await?;
//! let logs = client.filter_logs(contract, BlockRange::new(from, to)?).await?;
//! ```
//!
//! [`LogSource`]: wheel_core::ports::LogSource

mod client;

pub use client::{EvmClientConfig, EvmLogClient};
