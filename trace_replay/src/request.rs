//! Requests handed to the replay engine.

use alloy::rpc::types::trace::geth::GethDebugTracingOptions;
use alloy::rpc::types::TransactionRequest;
use evm_replay_common::EthereumTxMsg;
use serde::{Deserialize, Serialize};

use crate::context::BlockContext;

/// What to replay.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TraceTargets {
    /// A committed message, replayed after `predecessors` in order.
    Tx {
        msg: EthereumTxMsg,
        predecessors: Vec<EthereumTxMsg>,
    },
    /// Every Ethereum message of a block in commit order. The engine treats
    /// each message as the predecessor of the ones after it.
    Block { txs: Vec<EthereumTxMsg> },
    /// An uncommitted call, evaluated on its own.
    Call { msg: TransactionRequest },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRequest {
    #[serde(flatten)]
    pub targets: TraceTargets,
    #[serde(flatten)]
    pub block: BlockContext,
    /// `None` selects the engine's default struct logger. This is not the same
    /// as a default-valued config, so it stays off the wire entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_config: Option<GethDebugTracingOptions>,
}

impl TraceRequest {
    pub fn tx(
        msg: EthereumTxMsg,
        predecessors: Vec<EthereumTxMsg>,
        block: BlockContext,
        trace_config: Option<GethDebugTracingOptions>,
    ) -> Self {
        Self::assemble(TraceTargets::Tx { msg, predecessors }, block, trace_config)
    }

    pub fn block(
        txs: Vec<EthereumTxMsg>,
        block: BlockContext,
        trace_config: Option<GethDebugTracingOptions>,
    ) -> Self {
        Self::assemble(TraceTargets::Block { txs }, block, trace_config)
    }

    pub fn call(
        msg: TransactionRequest,
        block: BlockContext,
        trace_config: Option<GethDebugTracingOptions>,
    ) -> Self {
        Self::assemble(TraceTargets::Call { msg }, block, trace_config)
    }

    fn assemble(
        targets: TraceTargets,
        block: BlockContext,
        trace_config: Option<GethDebugTracingOptions>,
    ) -> Self {
        Self {
            targets,
            block,
            trace_config,
        }
    }

    /// Number of Ethereum messages the engine will execute.
    pub fn payload_count(&self) -> usize {
        match &self.targets {
            TraceTargets::Tx { predecessors, .. } => predecessors.len() + 1,
            TraceTargets::Block { txs } => txs.len(),
            TraceTargets::Call { .. } => 1,
        }
    }
}
