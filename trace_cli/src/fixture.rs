//! Chain data loaded from a JSON file, for serving traces without a node's
//! block store.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;
use evm_ante::ForkSchedule;
use evm_replay_common::{BlockRecord, ConsensusParams, RlpEnvelopeCodec};
use serde::Deserialize;
use tracing::info;
use trace_replay::InMemoryLedger;

/// ```json
/// {
///   "chainId": 7000,
///   "forks": { "londonBlock": 0 },
///   "consensusParams": { "0": { "blockMaxGas": 30000000, "blockMaxBytes": 22020096 } },
///   "blocks": [{ "height": 1, "time": 1700000001, "hash": "0x..", "proposerAddress": "0x..", "txs": ["0x.."] }]
/// }
/// ```
///
/// `forks` defaults to every fork active from genesis. Consensus params apply
/// from the height they are keyed by until the next entry.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Fixture {
    pub chain_id: u64,
    #[serde(default = "ForkSchedule::all_active")]
    pub forks: ForkSchedule,
    #[serde(default)]
    pub consensus_params: BTreeMap<u64, ConsensusParams>,
    #[serde(default)]
    pub blocks: Vec<BlockRecord>,
}

impl Fixture {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let des = &mut serde_json::Deserializer::from_str(json);
        let fixture = serde_path_to_error::deserialize(des)?;
        Ok(fixture)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading ledger fixture {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing ledger fixture {}", path.display()))
    }

    /// Indexes every block. Transactions that fail to decode are kept in their
    /// block but cannot be looked up by hash.
    pub fn ledger(&self) -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new();
        for (&height, &params) in &self.consensus_params {
            ledger.set_consensus_params(height, params);
        }
        let indexed: usize = self
            .blocks
            .iter()
            .cloned()
            .map(|block| ledger.index_block(&RlpEnvelopeCodec, block))
            .sum();
        info!(
            blocks = ledger.block_count(),
            indexed, "loaded ledger fixture"
        );
        ledger
    }
}
