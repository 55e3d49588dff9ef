//! A ledger held entirely in memory.

use std::collections::{BTreeMap, HashMap};

use alloy::primitives::B256;
use evm_replay_common::{BlockRecord, ConsensusParams, EnvelopeCodec, Msg, TxLocation};
use tracing::warn;

use crate::backend::{ConsensusParamsSource, LedgerStore};

/// Serves committed blocks, the hash index and consensus params from maps.
///
/// Consensus params apply from the height they are set at until the next
/// update, like on chain.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    blocks: BTreeMap<u64, BlockRecord>,
    locations: HashMap<B256, TxLocation>,
    params: BTreeMap<u64, ConsensusParams>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `block` and indexes the hash of every Ethereum message in it.
    /// Returns how many messages were indexed.
    pub fn index_block<D: EnvelopeCodec>(&mut self, codec: &D, block: BlockRecord) -> usize {
        let mut indexed = 0;
        for (tx_index, bytes) in (0u32..).zip(&block.txs) {
            let envelope = match codec.decode(bytes) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(
                        height = block.height,
                        index = tx_index,
                        error = %e,
                        "not indexing undecodable transaction"
                    );
                    continue;
                }
            };
            for (msg_index, msg) in (0u32..).zip(&envelope.messages) {
                if let Msg::Ethereum(eth) = msg {
                    self.locations.insert(
                        eth.hash(),
                        TxLocation {
                            height: block.height,
                            tx_index,
                            msg_index,
                        },
                    );
                    indexed += 1;
                }
            }
        }
        self.insert_block(block);
        indexed
    }

    /// Stores `block` without touching the hash index.
    pub fn insert_block(&mut self, block: BlockRecord) {
        self.blocks.insert(block.height, block);
    }

    pub fn set_tx_location(&mut self, hash: B256, location: TxLocation) {
        self.locations.insert(hash, location);
    }

    pub fn set_consensus_params(&mut self, from_height: u64, params: ConsensusParams) {
        self.params.insert(from_height, params);
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl LedgerStore for InMemoryLedger {
    async fn tx_location(&self, hash: B256) -> anyhow::Result<Option<TxLocation>> {
        Ok(self.locations.get(&hash).copied())
    }

    async fn block_by_height(&self, height: u64) -> anyhow::Result<Option<BlockRecord>> {
        Ok(self.blocks.get(&height).cloned())
    }
}

impl ConsensusParamsSource for InMemoryLedger {
    async fn consensus_params(&self, height: u64) -> anyhow::Result<ConsensusParams> {
        self.params
            .range(..=height)
            .next_back()
            .map(|(_, params)| *params)
            .ok_or_else(|| anyhow::anyhow!("no consensus params at height {height}"))
    }
}
