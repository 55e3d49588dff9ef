//! Collaborators the trace pipeline reads from and hands requests to.

use std::future::Future;

use alloy::primitives::{Bytes, B256};
use evm_replay_common::{BlockRecord, ConsensusParams, TxLocation};

use crate::context::ReplayContext;
use crate::request::TraceRequest;

/// Committed blocks and the index from Ethereum transaction hash to position.
pub trait LedgerStore {
    /// `Ok(None)` if the hash was never indexed.
    fn tx_location(
        &self,
        hash: B256,
    ) -> impl Future<Output = anyhow::Result<Option<TxLocation>>> + Send;

    fn block_by_height(
        &self,
        height: u64,
    ) -> impl Future<Output = anyhow::Result<Option<BlockRecord>>> + Send;
}

pub trait ConsensusParamsSource {
    fn consensus_params(
        &self,
        height: u64,
    ) -> impl Future<Output = anyhow::Result<ConsensusParams>> + Send;
}

/// The deterministic execution engine that turns a [`TraceRequest`] into
/// trace output. The returned bytes are opaque to the pipeline until they
/// reach the [`response`](crate::response) decoders.
pub trait ReplayEngine {
    fn trace_tx(
        &self,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> impl Future<Output = anyhow::Result<Bytes>> + Send;

    fn trace_block(
        &self,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> impl Future<Output = anyhow::Result<Bytes>> + Send;

    fn trace_call(
        &self,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> impl Future<Output = anyhow::Result<Bytes>> + Send;
}

impl<T: LedgerStore> LedgerStore for &T {
    fn tx_location(
        &self,
        hash: B256,
    ) -> impl Future<Output = anyhow::Result<Option<TxLocation>>> + Send {
        (**self).tx_location(hash)
    }

    fn block_by_height(
        &self,
        height: u64,
    ) -> impl Future<Output = anyhow::Result<Option<BlockRecord>>> + Send {
        (**self).block_by_height(height)
    }
}

impl<T: ConsensusParamsSource> ConsensusParamsSource for &T {
    fn consensus_params(
        &self,
        height: u64,
    ) -> impl Future<Output = anyhow::Result<ConsensusParams>> + Send {
        (**self).consensus_params(height)
    }
}

impl<T: ReplayEngine> ReplayEngine for &T {
    fn trace_tx(
        &self,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> impl Future<Output = anyhow::Result<Bytes>> + Send {
        (**self).trace_tx(ctx, request)
    }

    fn trace_block(
        &self,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> impl Future<Output = anyhow::Result<Bytes>> + Send {
        (**self).trace_block(ctx, request)
    }

    fn trace_call(
        &self,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> impl Future<Output = anyhow::Result<Bytes>> + Send {
        (**self).trace_call(ctx, request)
    }
}
