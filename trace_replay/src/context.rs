//! Which state a replay runs against, and the block metadata it runs with.

use alloy::primitives::{Bytes, B256};
use evm_replay_common::BlockRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::ConsensusParamsSource;
use crate::error::{TraceError, Upstream};

/// Passed alongside every request to the replay engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayContext {
    /// Height of the committed state the engine should start from.
    pub snapshot_height: u64,
}

/// The snapshot a block at `height` is replayed on top of: the state at the
/// end of the previous block.
///
/// Height 0 means "latest" to snapshot lookups, so the result is never
/// below 1.
pub fn snapshot_height(height: u64) -> u64 {
    height.saturating_sub(1).max(1)
}

impl ReplayContext {
    pub fn for_block(height: u64) -> Self {
        Self {
            snapshot_height: snapshot_height(height),
        }
    }
}

/// Block-level execution parameters embedded in every trace request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockContext {
    pub block_number: u64,
    pub block_time: u64,
    pub block_hash: B256,
    pub proposer_address: Bytes,
    pub chain_id: u64,
    pub block_max_gas: i64,
}

/// Fetches the consensus limits in force at `block` and pairs them with the
/// block's own metadata. Failing to get the limits fails the trace: without
/// them replay cost is unbounded.
pub async fn resolve<C: ConsensusParamsSource>(
    params: &C,
    chain_id: u64,
    block: &BlockRecord,
) -> Result<(ReplayContext, BlockContext), TraceError> {
    let consensus = params
        .consensus_params(block.height)
        .await
        .map_err(TraceError::upstream(Upstream::ConsensusParams))?;

    let replay = ReplayContext::for_block(block.height);
    debug!(
        height = block.height,
        snapshot_height = replay.snapshot_height,
        block_max_gas = consensus.block_max_gas,
        "resolved trace context"
    );
    Ok((
        replay,
        BlockContext {
            block_number: block.height,
            block_time: block.time,
            block_hash: block.hash,
            proposer_address: block.proposer_address.clone(),
            chain_id,
            block_max_gas: consensus.block_max_gas,
        },
    ))
}
