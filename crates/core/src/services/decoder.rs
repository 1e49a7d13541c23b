//! Event decoder: raw contract logs to typed wheel events.
//!
//! Only two events are recognized. Every other log emitted by the contract
//! is skipped without error.

use alloy_primitives::{Address, B256, U256, keccak256};

use crate::error::{DomainError, DomainResult};
use crate::models::{Contribution, DecodedEvent, PrizeDraw, to_hex_lower};
use crate::ports::RawLog;

/// Canonical signature of the contribution event.
pub const REQUEST_CREATED_SIGNATURE: &str = "RequestCreated(address,uint256,uint256)";

/// Canonical signature of the prize-draw event.
pub const RESPONSE_CREATED_SIGNATURE: &str = "ResponseCreated(address,uint256,uint256[])";

/// ABI word size in bytes.
const WORD_SIZE: usize = 32;

/// Number of leading ABI header words (offset, length) dropped from a
/// prize-draw payload when it carries more than one word.
const PRIZE_HEADER_WORDS: usize = 2;

/// Decoder holding the precomputed signature hashes (topic0) of both events.
#[derive(Debug, Clone)]
pub struct EventDecoder {
    contribution_topic: B256,
    prize_draw_topic: B256,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDecoder {
    /// Decoder for `RequestCreated` / `ResponseCreated`.
    pub fn new() -> Self {
        Self::with_signatures(REQUEST_CREATED_SIGNATURE, RESPONSE_CREATED_SIGNATURE)
    }

    /// Decoder for events with the same layout under other canonical signatures.
    pub fn with_signatures(contribution: &str, prize_draw: &str) -> Self {
        Self {
            contribution_topic: keccak256(contribution.as_bytes()),
            prize_draw_topic: keccak256(prize_draw.as_bytes()),
        }
    }

    pub fn contribution_topic(&self) -> B256 {
        self.contribution_topic
    }

    pub fn prize_draw_topic(&self) -> B256 {
        self.prize_draw_topic
    }

    /// Decode one log.
    ///
    /// Returns `Ok(None)` for logs with no topics or an unknown topic0.
    /// A recognized log with the wrong shape yields
    /// [`DomainError::MalformedLog`]; an amount wider than 256 bits yields
    /// [`DomainError::RangeOverflow`].
    pub fn decode(&self, log: &RawLog) -> DomainResult<Option<DecodedEvent>> {
        let Some(topic0) = log.topics.first() else {
            return Ok(None);
        };

        if *topic0 == self.contribution_topic {
            decode_contribution(log).map(|c| Some(DecodedEvent::Contribution(c)))
        } else if *topic0 == self.prize_draw_topic {
            decode_prize_draw(log).map(|p| Some(DecodedEvent::PrizeDraw(p)))
        } else {
            Ok(None)
        }
    }
}

// =============================================================================
// Event layouts
// =============================================================================

fn decode_contribution(log: &RawLog) -> DomainResult<Contribution> {
    let (user, request_id) = indexed_user_and_request(log)?;
    let amount = decode_uint(&log.data, log)?;

    Ok(Contribution {
        user,
        request_id,
        amount,
        tx_hash: log.tx_hash,
        log_index: log.log_index,
    })
}

fn decode_prize_draw(log: &RawLog) -> DomainResult<PrizeDraw> {
    let (user, request_id) = indexed_user_and_request(log)?;

    if log.data.len() % WORD_SIZE != 0 {
        return Err(DomainError::MalformedLog(format!(
            "ResponseCreated payload of {} bytes is not a multiple of {} (tx {}, log {})",
            log.data.len(),
            WORD_SIZE,
            to_hex_lower(log.tx_hash),
            log.log_index
        )));
    }

    let mut prizes: Vec<U256> = log
        .data
        .chunks_exact(WORD_SIZE)
        .map(U256::from_be_slice)
        .collect();

    if prizes.len() > 1 {
        prizes.drain(..PRIZE_HEADER_WORDS);
    }

    Ok(PrizeDraw {
        user,
        request_id,
        prizes,
        tx_hash: log.tx_hash,
        log_index: log.log_index,
    })
}

/// Both events index `(address user, uint256 requestId)` in topics 1 and 2.
fn indexed_user_and_request(log: &RawLog) -> DomainResult<(Address, U256)> {
    let [_, user, request_id, ..] = log.topics.as_slice() else {
        return Err(DomainError::MalformedLog(format!(
            "expected at least 3 topics, got {} (tx {}, log {})",
            log.topics.len(),
            to_hex_lower(log.tx_hash),
            log.log_index
        )));
    };

    Ok((
        Address::from_word(*user),
        U256::from_be_slice(request_id.as_slice()),
    ))
}

/// Big-endian unsigned integer spanning the whole slice.
fn decode_uint(bytes: &[u8], log: &RawLog) -> DomainResult<U256> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let significant = &bytes[start..];

    U256::try_from_be_slice(significant).ok_or_else(|| DomainError::RangeOverflow {
        field: "amount".to_string(),
        value: to_hex_lower(significant),
        tx_hash: to_hex_lower(log.tx_hash),
        log_index: log.log_index,
    })
}
