mod common;

use alloy::primitives::B256;
use alloy::rpc::types::trace::geth::{
    GethDebugBuiltInTracerType, GethDebugTracerType, GethDebugTracingOptions,
};
use alloy::rpc::types::TransactionRequest;
use assert2::{check, let_assert};
use common::{
    api, blk, env, eth, garbage, hash, ledger, native, payload, Method, Recorder, MAX_GAS,
};
use evm_replay_common::testing::CHAIN_ID;
use evm_replay_common::{RlpEnvelopeCodec, TxLocation};
use serde_json::{json, Value};
use trace_replay::InMemoryLedger;
use trace_replay::{ErrorKind, TraceError, TraceTargets, Upstream};

fn call_tracer() -> GethDebugTracingOptions {
    GethDebugTracingOptions {
        tracer: Some(GethDebugTracerType::BuiltInTracer(
            GethDebugBuiltInTracerType::CallTracer,
        )),
        ..Default::default()
    }
}

/// Tracer configs as they go over the wire.
fn wire(config: &Option<GethDebugTracingOptions>) -> Option<Value> {
    config
        .as_ref()
        .map(|config| serde_json::to_value(config).unwrap())
}

#[tokio::test]
async fn mixed_block_by_hash_and_as_a_whole() {
    let (a, c) = (eth(1, 0), eth(2, 0));
    let ledger = ledger([blk(5, [env([a.clone()]), env([native()]), env([c.clone()])])]);
    let engine = Recorder::default();
    let api = api(&ledger, &engine);

    let trace = api.trace_transaction(hash(&c), None).await.unwrap();
    check!(trace == json!({ "payloads": 2, "snapshot": 4 }));

    let results = api.trace_block(5, None).await.unwrap();
    check!(results.len() == 3);
    check!(results[0].result == Some(json!({ "position": 0 })));
    check!(results[1].is_placeholder());
    check!(results[2].result == Some(json!({ "position": 1 })));

    let calls = engine.calls();
    let_assert!(
        [(Method::Tx, tx_ctx, tx_req), (Method::Block, block_ctx, block_req)] = &calls[..]
    );
    check!(tx_ctx.snapshot_height == 4);
    check!(block_ctx.snapshot_height == 4);
    let_assert!(TraceTargets::Tx { msg, predecessors } = &tx_req.targets);
    check!(*msg == payload(&c));
    check!(*predecessors == [payload(&a)]);
    let_assert!(TraceTargets::Block { txs } = &block_req.targets);
    check!(*txs == [payload(&a), payload(&c)]);
}

#[tokio::test]
async fn request_carries_block_context() {
    let a = eth(1, 0);
    let ledger = ledger([blk(9, [env([a.clone()])])]);
    let engine = Recorder::default();
    let prepared = api(&ledger, &engine)
        .prepare_transaction(hash(&a), None)
        .await
        .unwrap();

    let block = &prepared.request.block;
    check!(block.block_number == 9);
    check!(block.block_time == 1_700_000_009);
    check!(block.block_hash == B256::with_last_byte(9));
    check!(block.proposer_address.as_ref() == [0xaa; 20]);
    check!(block.chain_id == CHAIN_ID);
    check!(block.block_max_gas == MAX_GAS);
    check!(prepared.request.trace_config.is_none());
    check!(engine.calls().is_empty());
}

#[tokio::test]
async fn predecessors_span_block_and_envelope() {
    let (a, b, c, d) = (eth(1, 0), eth(2, 0), eth(3, 0), eth(4, 0));
    let ledger = ledger([blk(
        3,
        [
            env([a.clone(), native()]),
            garbage(),
            env([native(), b.clone(), c.clone(), d.clone()]),
        ],
    )]);
    let engine = Recorder::default();
    let prepared = api(&ledger, &engine)
        .prepare_transaction(hash(&c), None)
        .await
        .unwrap();
    let_assert!(TraceTargets::Tx { msg, predecessors } = prepared.request.targets);
    check!(msg == payload(&c));
    check!(predecessors == [payload(&a), payload(&b)]);
}

#[tokio::test]
async fn genesis_is_not_traceable() {
    let a = eth(1, 0);
    let mut ledger = ledger([blk(0, [env([a.clone()])])]);
    ledger.set_tx_location(
        B256::repeat_byte(1),
        TxLocation {
            height: 0,
            tx_index: 0,
            msg_index: 0,
        },
    );
    let engine = Recorder::default();
    for hash in [hash(&a), B256::repeat_byte(1)] {
        let_assert!(Err(err) = api(&ledger, &engine).trace_transaction(hash, None).await);
        let_assert!(TraceError::Genesis = &err);
        check!(err.kind() == ErrorKind::OutOfBounds);
        check!(err.to_string() == "genesis is not traceable");
    }
    check!(engine.calls().is_empty());
}

#[tokio::test]
async fn unknown_hash_is_not_found() {
    let ledger = ledger([blk(2, [env([eth(1, 0)])])]);
    let engine = Recorder::default();
    let_assert!(
        Err(err) = api(&ledger, &engine)
            .trace_transaction(B256::repeat_byte(0xee), None)
            .await
    );
    let_assert!(TraceError::TxNotFound { hash } = &err);
    check!(*hash == B256::repeat_byte(0xee));
    check!(err.kind() == ErrorKind::NotFound);
}

#[tokio::test]
async fn stale_index_is_out_of_bounds() {
    let a = eth(1, 0);
    let mut ledger = ledger([blk(2, [env([a.clone()])])]);
    // The index points one past the last transaction of the block.
    ledger.set_tx_location(
        hash(&a),
        TxLocation {
            height: 2,
            tx_index: 1,
            msg_index: 0,
        },
    );
    let engine = Recorder::default();
    let_assert!(Err(err) = api(&ledger, &engine).trace_transaction(hash(&a), None).await);
    let_assert!(
        TraceError::TxIndexOutOfBounds {
            height: 2,
            tx_index: 1,
            tx_count: 1
        } = &err
    );
    check!(err.kind() == ErrorKind::OutOfBounds);
}

#[tokio::test]
async fn missing_block_is_not_found() {
    let a = eth(1, 0);
    let mut ledger = ledger([]);
    ledger.set_tx_location(
        hash(&a),
        TxLocation {
            height: 4,
            tx_index: 0,
            msg_index: 0,
        },
    );
    let engine = Recorder::default();
    let_assert!(Err(err) = api(&ledger, &engine).trace_transaction(hash(&a), None).await);
    let_assert!(TraceError::BlockNotFound { height: 4 } = err);
    let_assert!(
        Err(TraceError::BlockNotFound { height: 7 }) =
            api(&ledger, &engine).trace_block(7, None).await
    );
}

#[tokio::test]
async fn block_trace_skips_undecodable_transactions() {
    let (a, b, c) = (eth(1, 0), eth(2, 0), eth(3, 0));
    let ledger = ledger([blk(
        8,
        [env([a.clone()]), env([b.clone()]), garbage(), env([c.clone()])],
    )]);
    let engine = Recorder::default();
    let results = api(&ledger, &engine).trace_block(8, None).await.unwrap();

    check!(results.len() == 4);
    check!(results[2].is_placeholder());
    let_assert!(Some(reason) = &results[2].error);
    check!(reason.starts_with("failed to decode transaction"));

    let calls = engine.calls();
    let_assert!([(Method::Block, ctx, request)] = &calls[..]);
    check!(ctx.snapshot_height == 7);
    let_assert!(TraceTargets::Block { txs } = &request.targets);
    check!(*txs == [payload(&a), payload(&b), payload(&c)]);
}

#[tokio::test]
async fn empty_block_short_circuits() {
    // No consensus params at all: resolving them would fail.
    let mut ledger = InMemoryLedger::new();
    ledger.insert_block(blk(4, []));
    let engine = Recorder::default();
    let results = api(&ledger, &engine).trace_block(4, None).await.unwrap();
    check!(results.is_empty());
    check!(engine.calls().is_empty());
}

#[tokio::test]
async fn missing_consensus_params_fail_the_trace() {
    let a = eth(1, 0);
    let mut ledger = InMemoryLedger::new();
    ledger.index_block(&RlpEnvelopeCodec, blk(6, [env([a.clone()])]));
    let engine = Recorder::default();
    let_assert!(Err(err) = api(&ledger, &engine).trace_transaction(hash(&a), None).await);
    let_assert!(
        TraceError::UpstreamUnavailable {
            upstream: Upstream::ConsensusParams,
            ..
        } = &err
    );
    check!(err.kind() == ErrorKind::UpstreamUnavailable);
    check!(engine.calls().is_empty());
}

#[tokio::test]
async fn engine_failure_is_surfaced() {
    let a = eth(1, 0);
    let ledger = ledger([blk(6, [env([a.clone()])])]);
    let engine = Recorder::failing();
    let_assert!(Err(err) = api(&ledger, &engine).trace_transaction(hash(&a), None).await);
    let_assert!(
        TraceError::UpstreamUnavailable {
            upstream: Upstream::ReplayEngine,
            source
        } = err
    );
    check!(source.to_string() == "connection refused");
    // A failed call is not retried.
    check!(engine.calls().len() == 1);
}

#[tokio::test]
async fn malformed_engine_output() {
    let a = eth(1, 0);
    let ledger = ledger([blk(6, [env([a.clone()]), env([native()])])]);

    let engine = Recorder::answering(b"not json");
    let_assert!(Err(err) = api(&ledger, &engine).trace_transaction(hash(&a), None).await);
    check!(err.kind() == ErrorKind::MalformedResponse);

    let engine = Recorder::answering(br#"[{"result": {}}, {"result": {}}, {"result": {}}]"#);
    let_assert!(Err(err) = api(&ledger, &engine).trace_block(6, None).await);
    check!(err.kind() == ErrorKind::MalformedResponse);

    // One result per block transaction is taken as is.
    let engine = Recorder::answering(br#"[{"result": {"a": 1}}, {"error": "skipped"}]"#);
    let results = api(&ledger, &engine).trace_block(6, None).await.unwrap();
    check!(results.len() == 2);
    check!(results[1].error.as_deref() == Some("skipped"));
}

#[tokio::test]
async fn call_trace_has_no_predecessors() {
    let ledger = ledger([blk(1, [env([eth(1, 0)])]), blk(10, [env([eth(2, 0)])])]);
    let engine = Recorder::default();
    let api = api(&ledger, &engine);

    let trace = api
        .trace_call(TransactionRequest::default(), 10, None)
        .await
        .unwrap();
    check!(trace == json!({ "payloads": 1, "snapshot": 9 }));

    api.trace_call(TransactionRequest::default(), 1, Some(call_tracer()))
        .await
        .unwrap();

    let calls = engine.calls();
    let_assert!(
        [(Method::Call, first_ctx, first), (Method::Call, second_ctx, second)] = &calls[..]
    );
    check!(first_ctx.snapshot_height == 9);
    check!(second_ctx.snapshot_height == 1);
    let_assert!(TraceTargets::Call { .. } = &first.targets);
    check!(first.trace_config.is_none());
    check!(wire(&second.trace_config) == wire(&Some(call_tracer())));
    check!(second.block.block_number == 1);
}

#[tokio::test]
async fn tracer_config_is_passed_through_unchanged() {
    let a = eth(1, 0);
    let ledger = ledger([blk(2, [env([a.clone()])])]);
    let engine = Recorder::default();
    let api = api(&ledger, &engine);

    api.trace_transaction(hash(&a), Some(call_tracer()))
        .await
        .unwrap();
    api.trace_block(2, Some(GethDebugTracingOptions::default()))
        .await
        .unwrap();
    api.trace_block(2, None).await.unwrap();

    let configs: Vec<_> = engine
        .calls()
        .iter()
        .map(|(_, _, request)| wire(&request.trace_config))
        .collect();
    check!(
        configs
            == [
                wire(&Some(call_tracer())),
                wire(&Some(GethDebugTracingOptions::default())),
                None
            ]
    );
    check!(configs[1].is_some());
}
