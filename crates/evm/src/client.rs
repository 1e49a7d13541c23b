//! EVM JSON-RPC client serving contract logs over `eth_getLogs`.

use alloy::network::Ethereum;
use alloy::primitives::Address;
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::{Filter, Log};
use async_trait::async_trait;
use tracing::{debug, instrument, trace};
use url::Url;

use wheel_core::error::{ChainError, ChainResult};
use wheel_core::models::BlockRange;
use wheel_core::ports::{LogSource, RawLog};

/// Configuration for the EVM client.
#[derive(Debug, Clone)]
pub struct EvmClientConfig {
    /// HTTP JSON-RPC URL (e.g., "https://eth.llamarpc.com").
    pub rpc_url: String,
}

impl Default for EvmClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
        }
    }
}

/// EVM client adapter implementing the LogSource port.
pub struct EvmLogClient {
    provider: RootProvider<Ethereum>,
}

impl EvmLogClient {
    /// Build a client without touching the network.
    pub fn new(config: &EvmClientConfig) -> ChainResult<Self> {
        let url = Url::parse(&config.rpc_url).map_err(|e| ChainError::InvalidUrl(e.to_string()))?;
        let provider = RootProvider::<Ethereum>::new_http(url);
        Ok(Self { provider })
    }

    /// Build a client and check that the node answers.
    #[instrument(skip_all)]
    pub async fn connect(config: &EvmClientConfig) -> ChainResult<Self> {
        debug!("Connecting to node");

        let client = Self::new(config)?;
        let head = client
            .provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::ConnectionFailed(e.to_string()))?;

        debug!(head, "Connected successfully");

        Ok(client)
    }
}

#[async_trait]
impl LogSource for EvmLogClient {
    #[instrument(skip(self), fields(range = %range))]
    async fn filter_logs(&self, address: Address, range: BlockRange) -> ChainResult<Vec<RawLog>> {
        let filter = Filter::new()
            .address(address)
            .from_block(range.start())
            .to_block(range.end());

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?;

        trace!(count = logs.len(), "eth_getLogs answered");

        logs.into_iter().map(into_raw_log).collect()
    }

    async fn latest_block(&self) -> ChainResult<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }
}

// =============================================================================
// Log conversion
// =============================================================================

/// Convert an RPC log into the domain's raw form.
///
/// Pending logs carry no transaction hash or log index, and without them
/// the record cannot be deduplicated, so they are rejected.
fn into_raw_log(log: Log) -> ChainResult<RawLog> {
    let tx_hash = log
        .transaction_hash
        .ok_or_else(|| ChainError::InvalidLog("missing transaction hash".to_string()))?;
    let log_index = log.log_index.ok_or_else(|| {
        ChainError::InvalidLog(format!("missing log index (tx 0x{})", hex::encode(&tx_hash[..8])))
    })?;

    Ok(RawLog {
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
        tx_hash,
        log_index,
        block_number: log.block_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{B256, Bytes, LogData};

    fn rpc_log(tx_hash: Option<B256>, log_index: Option<u64>) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0x7e),
                data: LogData::new_unchecked(
                    vec![B256::repeat_byte(1), B256::repeat_byte(2)],
                    Bytes::from(vec![0u8, 1, 2]),
                ),
            },
            block_number: Some(20_977_112),
            transaction_hash: tx_hash,
            log_index,
            ..Default::default()
        }
    }

    #[test]
    fn test_log_conversion_keeps_fields() {
        let raw = into_raw_log(rpc_log(Some(B256::repeat_byte(0xab)), Some(4))).unwrap();

        assert_eq!(raw.topics, vec![B256::repeat_byte(1), B256::repeat_byte(2)]);
        assert_eq!(raw.data, Bytes::from(vec![0u8, 1, 2]));
        assert_eq!(raw.tx_hash, B256::repeat_byte(0xab));
        assert_eq!(raw.log_index, 4);
        assert_eq!(raw.block_number, Some(20_977_112));
    }

    // Test critique: un log sans clé de déduplication est refusé
    #[test]
    fn test_pending_log_is_rejected() {
        let err = into_raw_log(rpc_log(None, Some(1))).unwrap_err();
        assert!(matches!(err, ChainError::InvalidLog(_)));

        let err = into_raw_log(rpc_log(Some(B256::repeat_byte(0xab)), None)).unwrap_err();
        assert!(err.to_string().contains("abababab"));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let config = EvmClientConfig {
            rpc_url: "not a url".to_string(),
        };
        assert!(matches!(
            EvmLogClient::new(&config),
            Err(ChainError::InvalidUrl(_))
        ));
    }
}
