//! Committed blocks as seen by the ledger store.

use alloy::primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// A committed block: header fields plus the raw, still encoded transactions
/// in commit order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub height: u64,
    /// Block time as unix seconds.
    pub time: u64,
    pub hash: B256,
    pub proposer_address: Bytes,
    pub txs: Vec<Bytes>,
}

impl BlockRecord {
    /// Ledger hash of the transaction at `index`: `sha256` over its encoded
    /// envelope. Not to be confused with the keccak hash of an Ethereum message.
    pub fn tx_hash(&self, index: usize) -> Option<B256> {
        self.txs.get(index).map(|tx| envelope_hash(tx))
    }

    /// Hex rendering of [`BlockRecord::tx_hash`] as it shows up in logs.
    pub fn tx_hash_hex(&self, index: usize) -> Option<String> {
        self.tx_hash(index).map(hex::encode_upper)
    }
}

pub fn envelope_hash(bytes: &[u8]) -> B256 {
    B256::from_slice(&Sha256::digest(bytes))
}

/// Where an Ethereum message was committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxLocation {
    pub height: u64,
    /// Position of the enclosing envelope in [`BlockRecord::txs`].
    pub tx_index: u32,
    /// Position of the message inside its envelope.
    pub msg_index: u32,
}

/// The subset of consensus parameters a replay needs.
///
/// `-1` means unlimited for both fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusParams {
    pub block_max_gas: i64,
    pub block_max_bytes: i64,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            block_max_gas: -1,
            block_max_bytes: 22_020_096,
        }
    }
}
