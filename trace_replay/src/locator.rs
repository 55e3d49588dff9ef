//! Resolving a transaction hash to the block that holds it.

use alloy::primitives::B256;
use evm_replay_common::{checked_tx_count, BlockRecord, TxLocation};
use tracing::debug;

use crate::backend::LedgerStore;
use crate::error::{TraceError, Upstream};

/// A transaction position checked against the block it points into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Located {
    pub location: TxLocation,
    pub block: BlockRecord,
}

pub async fn fetch_block<L: LedgerStore>(
    ledger: &L,
    height: u64,
) -> Result<BlockRecord, TraceError> {
    ledger
        .block_by_height(height)
        .await
        .map_err(TraceError::upstream(Upstream::LedgerStore))?
        .ok_or_else(|| {
            debug!(height, "block not found");
            TraceError::BlockNotFound { height }
        })
}

/// Looks `hash` up in the ledger index and validates the result against the
/// canonical block content, which the index may have drifted from.
pub async fn locate<L: LedgerStore>(ledger: &L, hash: B256) -> Result<Located, TraceError> {
    let location = ledger
        .tx_location(hash)
        .await
        .map_err(TraceError::upstream(Upstream::LedgerStore))?
        .ok_or(TraceError::TxNotFound { hash })?;

    // There is no earlier state to replay a genesis transaction on.
    if location.height == 0 {
        return Err(TraceError::Genesis);
    }

    let block = fetch_block(ledger, location.height).await?;
    let tx_count = checked_tx_count(block.txs.len()).ok_or(TraceError::Overflow {
        height: block.height,
        count: block.txs.len(),
    })?;
    if location.tx_index >= tx_count {
        debug!(
            index = location.tx_index,
            %hash,
            height = block.height,
            "tx index out of bounds"
        );
        return Err(TraceError::TxIndexOutOfBounds {
            height: block.height,
            tx_index: location.tx_index,
            tx_count: block.txs.len(),
        });
    }

    Ok(Located { location, block })
}
