#![allow(dead_code)]

use std::sync::Mutex;

use alloy::primitives::{Bytes, B256};
use evm_replay_common::testing::{self, CHAIN_ID};
use evm_replay_common::{BlockRecord, ConsensusParams, EthereumTxMsg, Msg, RlpEnvelopeCodec};
use serde_json::json;
use trace_replay::{InMemoryLedger, ReplayContext, ReplayEngine, TraceApi, TraceRequest};

pub const MAX_GAS: i64 = 30_000_000;

/// An Ethereum message signed by a key derived from `seed`.
pub fn eth(seed: u8, nonce: u64) -> Msg {
    testing::eth_msg(&testing::eip1559_tx(&testing::signer(seed), CHAIN_ID, nonce))
}

pub fn native() -> Msg {
    testing::native_msg(b"bank send")
}

pub fn payload(msg: &Msg) -> EthereumTxMsg {
    msg.as_ethereum().cloned().expect("ethereum message")
}

pub fn hash(msg: &Msg) -> B256 {
    payload(msg).hash()
}

pub fn env(msgs: impl Into<Vec<Msg>>) -> Bytes {
    testing::encoded_envelope(msgs.into())
}

pub fn garbage() -> Bytes {
    Bytes::from_static(b"\xc3\x01\x02")
}

pub fn blk(height: u64, txs: impl Into<Vec<Bytes>>) -> BlockRecord {
    BlockRecord {
        height,
        time: 1_700_000_000 + height,
        hash: B256::with_last_byte(height as u8),
        proposer_address: Bytes::from_static(&[0xaa; 20]),
        txs: txs.into(),
    }
}

/// A ledger holding `blocks`, all indexed, with consensus params from genesis.
pub fn ledger(blocks: impl IntoIterator<Item = BlockRecord>) -> InMemoryLedger {
    let mut ledger = InMemoryLedger::new();
    ledger.set_consensus_params(
        0,
        ConsensusParams {
            block_max_gas: MAX_GAS,
            ..Default::default()
        },
    );
    for block in blocks {
        ledger.index_block(&RlpEnvelopeCodec, block);
    }
    ledger
}

pub fn api<'a>(
    ledger: &'a InMemoryLedger,
    engine: &'a Recorder,
) -> TraceApi<&'a InMemoryLedger, &'a InMemoryLedger, &'a Recorder> {
    TraceApi::new(ledger, ledger, engine, CHAIN_ID)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Tx,
    Block,
    Call,
}

/// A replay engine that records every request and answers with one result
/// per executed payload.
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Mutex<Vec<(Method, ReplayContext, TraceRequest)>>,
    pub fail: bool,
    pub raw_response: Option<Bytes>,
}

impl Recorder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn answering(raw: &'static [u8]) -> Self {
        Self {
            raw_response: Some(Bytes::from_static(raw)),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(Method, ReplayContext, TraceRequest)> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(
        &self,
        method: Method,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> anyhow::Result<Bytes> {
        self.calls
            .lock()
            .unwrap()
            .push((method, ctx, request.clone()));
        if self.fail {
            anyhow::bail!("connection refused");
        }
        if let Some(raw) = &self.raw_response {
            return Ok(raw.clone());
        }
        let body = match method {
            Method::Tx | Method::Call => json!({
                "payloads": request.payload_count(),
                "snapshot": ctx.snapshot_height,
            }),
            Method::Block => (0..request.payload_count())
                .map(|i| json!({ "result": { "position": i } }))
                .collect(),
        };
        Ok(serde_json::to_vec(&body)?.into())
    }
}

impl ReplayEngine for Recorder {
    async fn trace_tx(&self, ctx: ReplayContext, request: &TraceRequest) -> anyhow::Result<Bytes> {
        self.answer(Method::Tx, ctx, request)
    }

    async fn trace_block(
        &self,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> anyhow::Result<Bytes> {
        self.answer(Method::Block, ctx, request)
    }

    async fn trace_call(
        &self,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> anyhow::Result<Bytes> {
        self.answer(Method::Call, ctx, request)
    }
}
