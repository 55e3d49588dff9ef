use alloy::primitives::B256;
use evm_replay_common::DecodeError;
use thiserror::Error;

/// The collaborator a failed upstream call was made to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum Upstream {
    #[strum(to_string = "ledger store")]
    LedgerStore,
    #[strum(to_string = "consensus params source")]
    ConsensusParams,
    #[strum(to_string = "replay engine")]
    ReplayEngine,
}

/// Coarse classification of a [`TraceError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    InvalidEnvelopeType,
    NotFound,
    OutOfBounds,
    Overflow,
    UpstreamUnavailable,
    DecodeFailed,
    MalformedResponse,
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("transaction {hash} not found")]
    TxNotFound { hash: B256 },
    #[error("block {height} not found")]
    BlockNotFound { height: u64 },
    #[error("genesis is not traceable")]
    Genesis,
    #[error("transaction {tx_index} not included in block {height} with {tx_count} transactions")]
    TxIndexOutOfBounds {
        height: u64,
        tx_index: u32,
        tx_count: usize,
    },
    #[error(
        "message {msg_index} out of bounds for transaction {tx_index} of block {height} with {msg_count} messages"
    )]
    MsgIndexOutOfBounds {
        height: u64,
        tx_index: u32,
        msg_index: u32,
        msg_count: usize,
    },
    #[error("tx count {count} in block {height} is overflowing")]
    Overflow { height: u64, count: usize },
    #[error(
        "message {msg_index} of transaction {tx_index} in block {height} has type {type_url}, not an ethereum transaction"
    )]
    InvalidEnvelopeType {
        height: u64,
        tx_index: u32,
        msg_index: u32,
        type_url: String,
    },
    #[error("failed to decode transaction {tx_index} of block {height}")]
    DecodeFailed {
        height: u64,
        tx_index: u32,
        #[source]
        source: DecodeError,
    },
    #[error("{upstream} unavailable")]
    UpstreamUnavailable {
        upstream: Upstream,
        #[source]
        source: anyhow::Error,
    },
    #[error("malformed replay engine response: {0}")]
    MalformedResponse(String),
}

impl TraceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TxNotFound { .. } | Self::BlockNotFound { .. } => ErrorKind::NotFound,
            Self::Genesis | Self::TxIndexOutOfBounds { .. } | Self::MsgIndexOutOfBounds { .. } => {
                ErrorKind::OutOfBounds
            }
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::InvalidEnvelopeType { .. } => ErrorKind::InvalidEnvelopeType,
            Self::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            Self::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }

    pub(crate) fn upstream(upstream: Upstream) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Self::UpstreamUnavailable { upstream, source }
    }
}
