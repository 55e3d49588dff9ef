//! Rebuilding the ordered list of Ethereum messages that ran before a target.
//!
//! Envelopes that fail to decode are skipped rather than failing the whole
//! walk: an unrelated malformed transaction must not make a valid one
//! untraceable. Every skip is recorded as a [`TxOutcome::Skipped`] so callers
//! can inspect and log the reason.

use alloy::primitives::Bytes;
use evm_replay_common::{
    BlockRecord, DecodeError, EnvelopeCodec, EthereumTxMsg, Msg, TxLocation,
};
use tracing::debug;

use crate::error::TraceError;

/// What decoding one block transaction produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    /// The Ethereum messages of the envelope, in declaration order. Empty if
    /// the envelope only carried native messages.
    Decoded {
        tx_index: usize,
        payloads: Vec<EthereumTxMsg>,
    },
    Skipped {
        tx_index: usize,
        reason: DecodeError,
    },
}

impl TxOutcome {
    pub fn tx_index(&self) -> usize {
        match self {
            Self::Decoded { tx_index, .. } | Self::Skipped { tx_index, .. } => *tx_index,
        }
    }

    pub fn payloads(&self) -> &[EthereumTxMsg] {
        match self {
            Self::Decoded { payloads, .. } => payloads,
            Self::Skipped { .. } => &[],
        }
    }

    pub fn into_payloads(self) -> Vec<EthereumTxMsg> {
        match self {
            Self::Decoded { payloads, .. } => payloads,
            Self::Skipped { .. } => Vec::new(),
        }
    }
}

/// Decodes every transaction in `txs`, one outcome per transaction, in order.
pub fn walk<D: EnvelopeCodec>(codec: &D, txs: &[Bytes]) -> Vec<TxOutcome> {
    txs.iter()
        .enumerate()
        .map(|(tx_index, bytes)| match codec.decode(bytes) {
            Ok(envelope) => TxOutcome::Decoded {
                tx_index,
                payloads: envelope
                    .messages
                    .into_iter()
                    .filter_map(Msg::into_ethereum)
                    .collect(),
            },
            Err(reason) => TxOutcome::Skipped { tx_index, reason },
        })
        .collect()
}

/// A target message together with everything that must be replayed before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconstructed {
    pub target: EthereumTxMsg,
    /// Ethereum messages of transactions `[0, tx_index)`, followed by those at
    /// `[0, msg_index)` of the target's own envelope.
    pub predecessors: Vec<EthereumTxMsg>,
    /// Earlier transactions that were left out because they did not decode.
    pub skipped: Vec<TxOutcome>,
}

/// Collects the predecessors of the message at `location` in `block`.
///
/// Unlike its predecessors, the target envelope itself has to decode, and the
/// message at `location.msg_index` has to be an Ethereum message.
pub fn reconstruct<D: EnvelopeCodec>(
    codec: &D,
    block: &BlockRecord,
    location: TxLocation,
) -> Result<Reconstructed, TraceError> {
    let height = block.height;
    let tx_index = location.tx_index;
    let Some(target_bytes) = block.txs.get(tx_index as usize) else {
        return Err(TraceError::TxIndexOutOfBounds {
            height,
            tx_index,
            tx_count: block.txs.len(),
        });
    };
    let before = &block.txs[..tx_index as usize];

    let mut predecessors = Vec::new();
    let mut skipped = Vec::new();
    for outcome in walk(codec, before) {
        match outcome {
            TxOutcome::Decoded { payloads, .. } => predecessors.extend(payloads),
            TxOutcome::Skipped {
                tx_index: skipped_index,
                ref reason,
            } => {
                debug!(
                    height,
                    index = skipped_index,
                    hash = %block.tx_hash_hex(skipped_index).unwrap_or_default(),
                    error = %reason,
                    "failed to decode transaction in block"
                );
                skipped.push(outcome);
            }
        }
    }

    let envelope = codec.decode(target_bytes).map_err(|source| {
        debug!(height, index = tx_index, "failed to decode target transaction");
        TraceError::DecodeFailed {
            height,
            tx_index,
            source,
        }
    })?;

    let msg_count = envelope.messages.len();
    let msg_index = location.msg_index;
    if msg_index as usize >= msg_count {
        return Err(TraceError::MsgIndexOutOfBounds {
            height,
            tx_index,
            msg_index,
            msg_count,
        });
    }

    let mut messages = envelope.messages;
    messages.truncate(msg_index as usize + 1);
    let target = match messages.pop() {
        Some(Msg::Ethereum(target)) => target,
        other => {
            let type_url = other.as_ref().map(Msg::type_url).unwrap_or_default();
            debug!(height, index = tx_index, type_url, "invalid transaction type");
            return Err(TraceError::InvalidEnvelopeType {
                height,
                tx_index,
                msg_index,
                type_url: type_url.to_owned(),
            });
        }
    };
    predecessors.extend(messages.into_iter().filter_map(Msg::into_ethereum));

    Ok(Reconstructed {
        target,
        predecessors,
        skipped,
    })
}
