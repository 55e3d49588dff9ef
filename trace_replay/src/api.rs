use alloy::primitives::B256;
use alloy::rpc::types::trace::geth::GethDebugTracingOptions;
use alloy::rpc::types::TransactionRequest;
use evm_replay_common::{EnvelopeCodec, RlpEnvelopeCodec};
use itertools::Itertools as _;
use serde_json::Value;
use tracing::{debug, error};

use crate::backend::{ConsensusParamsSource, LedgerStore, ReplayEngine};
use crate::context::{resolve, ReplayContext};
use crate::error::{TraceError, Upstream};
use crate::locator::{fetch_block, locate};
use crate::predecessors::{reconstruct, walk, TxOutcome};
use crate::request::TraceRequest;
use crate::response::{decode_block_trace, decode_tx_trace, BlockLayout, TxTraceResult};

/// A request ready to go to the replay engine.
#[derive(Clone, Debug)]
pub struct PreparedTrace {
    pub context: ReplayContext,
    pub request: TraceRequest,
}

#[derive(Clone, Debug)]
pub struct PreparedBlockTrace {
    pub context: ReplayContext,
    pub request: TraceRequest,
    pub layout: BlockLayout,
}

/// The three trace queries: by transaction hash, by block height, and for a
/// speculative call on top of a historical block.
#[derive(Clone, Debug)]
pub struct TraceApi<L, C, R, D = RlpEnvelopeCodec> {
    ledger: L,
    params: C,
    engine: R,
    codec: D,
    chain_id: u64,
}

impl<L, C, R> TraceApi<L, C, R> {
    pub fn new(ledger: L, params: C, engine: R, chain_id: u64) -> Self {
        Self {
            ledger,
            params,
            engine,
            codec: RlpEnvelopeCodec,
            chain_id,
        }
    }
}

impl<L, C, R, D> TraceApi<L, C, R, D> {
    pub fn with_codec<D2: EnvelopeCodec>(self, codec: D2) -> TraceApi<L, C, R, D2> {
        TraceApi {
            ledger: self.ledger,
            params: self.params,
            engine: self.engine,
            codec,
            chain_id: self.chain_id,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

impl<L, C, R, D> TraceApi<L, C, R, D>
where
    L: LedgerStore,
    C: ConsensusParamsSource,
    D: EnvelopeCodec,
{
    pub async fn prepare_transaction(
        &self,
        hash: B256,
        config: Option<GethDebugTracingOptions>,
    ) -> Result<PreparedTrace, TraceError> {
        let located = locate(&self.ledger, hash).await?;
        let reconstructed = reconstruct(&self.codec, &located.block, located.location)?;
        let (context, block) = resolve(&self.params, self.chain_id, &located.block).await?;
        debug!(
            %hash,
            height = located.location.height,
            index = located.location.tx_index,
            predecessors = reconstructed.predecessors.len(),
            skipped = reconstructed.skipped.len(),
            "prepared transaction trace"
        );
        Ok(PreparedTrace {
            context,
            request: TraceRequest::tx(
                reconstructed.target,
                reconstructed.predecessors,
                block,
                config,
            ),
        })
    }

    /// `Ok(None)` for a block without transactions: there is nothing to
    /// replay, so no request is built.
    pub async fn prepare_block(
        &self,
        height: u64,
        config: Option<GethDebugTracingOptions>,
    ) -> Result<Option<PreparedBlockTrace>, TraceError> {
        let block = fetch_block(&self.ledger, height).await?;
        if block.txs.is_empty() {
            return Ok(None);
        }

        let outcomes = walk(&self.codec, &block.txs);
        for outcome in &outcomes {
            if let TxOutcome::Skipped { tx_index, reason } = outcome {
                error!(
                    height,
                    index = tx_index,
                    hash = %block.tx_hash_hex(*tx_index).unwrap_or_default(),
                    error = %reason,
                    "failed to decode transaction"
                );
            }
        }
        let layout = BlockLayout::new(&outcomes);
        let txs = outcomes
            .into_iter()
            .flat_map(TxOutcome::into_payloads)
            .collect_vec();

        let (context, block) = resolve(&self.params, self.chain_id, &block).await?;
        Ok(Some(PreparedBlockTrace {
            context,
            request: TraceRequest::block(txs, block, config),
            layout,
        }))
    }

    /// A speculative call runs against the state `block_height` started from,
    /// with nothing replayed before it.
    pub async fn prepare_call(
        &self,
        call: TransactionRequest,
        block_height: u64,
        config: Option<GethDebugTracingOptions>,
    ) -> Result<PreparedTrace, TraceError> {
        let block = fetch_block(&self.ledger, block_height).await?;
        let (context, block) = resolve(&self.params, self.chain_id, &block).await?;
        Ok(PreparedTrace {
            context,
            request: TraceRequest::call(call, block, config),
        })
    }
}

impl<L, C, R, D> TraceApi<L, C, R, D>
where
    L: LedgerStore,
    C: ConsensusParamsSource,
    R: ReplayEngine,
    D: EnvelopeCodec,
{
    pub async fn trace_transaction(
        &self,
        hash: B256,
        config: Option<GethDebugTracingOptions>,
    ) -> Result<Value, TraceError> {
        let PreparedTrace { context, request } = self.prepare_transaction(hash, config).await?;
        let bytes = self
            .engine
            .trace_tx(context, &request)
            .await
            .map_err(TraceError::upstream(Upstream::ReplayEngine))?;
        decode_tx_trace(&bytes)
    }

    /// One result per block transaction slot, see [`BlockLayout`].
    pub async fn trace_block(
        &self,
        height: u64,
        config: Option<GethDebugTracingOptions>,
    ) -> Result<Vec<TxTraceResult>, TraceError> {
        let Some(PreparedBlockTrace {
            context,
            request,
            layout,
        }) = self.prepare_block(height, config).await?
        else {
            return Ok(Vec::new());
        };
        let bytes = self
            .engine
            .trace_block(context, &request)
            .await
            .map_err(TraceError::upstream(Upstream::ReplayEngine))?;
        layout.fill(decode_block_trace(&bytes)?)
    }

    pub async fn trace_call(
        &self,
        call: TransactionRequest,
        block_height: u64,
        config: Option<GethDebugTracingOptions>,
    ) -> Result<Value, TraceError> {
        let PreparedTrace { context, request } =
            self.prepare_call(call, block_height, config).await?;
        let bytes = self
            .engine
            .trace_call(context, &request)
            .await
            .map_err(TraceError::upstream(Upstream::ReplayEngine))?;
        decode_tx_trace(&bytes)
    }
}
