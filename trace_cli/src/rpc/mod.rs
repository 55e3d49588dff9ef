//! A [`ReplayEngine`] that forwards trace requests to a replay node over
//! JSON-RPC.

use std::marker::PhantomData;

use alloy::primitives::Bytes;
use alloy::providers::Provider;
use alloy::transports::Transport;
use anyhow::Context as _;
use serde_json::Value;
use trace_replay::{ReplayContext, ReplayEngine, TraceRequest};

pub mod retry;

pub const TRACE_TX_METHOD: &str = "evm_traceTx";
pub const TRACE_BLOCK_METHOD: &str = "evm_traceBlock";
pub const TRACE_CALL_METHOD: &str = "evm_traceCall";

/// Sends `(request, snapshotHeight)` and hands back the JSON result as bytes.
///
/// The snapshot height is a `0x`-prefixed quantity, like block numbers on the
/// Ethereum JSON-RPC interface.
pub struct RpcReplayEngine<ProviderT, TransportT> {
    provider: ProviderT,
    _phantom: PhantomData<TransportT>,
}

impl<ProviderT, TransportT> RpcReplayEngine<ProviderT, TransportT>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    pub fn new(provider: ProviderT) -> Self {
        Self {
            provider,
            _phantom: PhantomData,
        }
    }

    async fn send(
        &self,
        method: &'static str,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> anyhow::Result<Bytes> {
        let result = self
            .provider
            .raw_request::<_, Value>(
                method.into(),
                (request.clone(), format!("{:#x}", ctx.snapshot_height)),
            )
            .await
            .with_context(|| format!("{method} at snapshot {}", ctx.snapshot_height))?;
        Ok(serde_json::to_vec(&result)?.into())
    }
}

impl<ProviderT, TransportT> ReplayEngine for RpcReplayEngine<ProviderT, TransportT>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    async fn trace_tx(&self, ctx: ReplayContext, request: &TraceRequest) -> anyhow::Result<Bytes> {
        self.send(TRACE_TX_METHOD, ctx, request).await
    }

    async fn trace_block(
        &self,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> anyhow::Result<Bytes> {
        self.send(TRACE_BLOCK_METHOD, ctx, request).await
    }

    async fn trace_call(
        &self,
        ctx: ReplayContext,
        request: &TraceRequest,
    ) -> anyhow::Result<Bytes> {
        self.send(TRACE_CALL_METHOD, ctx, request).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        borrow::Cow,
        collections::BTreeMap,
        future::ready,
        sync::{Arc, Mutex},
        task::{Context, Poll},
    };

    use alloy::{
        providers::RootProvider,
        rpc::json_rpc::{
            ErrorPayload, RequestMeta, RequestPacket, Response, ResponsePacket, ResponsePayload,
        },
        transports::{BoxTransport, TransportConnect, TransportError},
    };
    use assert2::{check, let_assert};
    use evm_replay_common::testing::CHAIN_ID;
    use futures::{future::BoxFuture, FutureExt as _};
    use serde::Serialize;
    use serde_json::json;
    use tower::Service;
    use trace_replay::{BlockContext, TraceTargets};

    use super::*;

    /// Fixed responses per JSON-RPC method, recording what was sent.
    #[derive(Clone, Default)]
    struct Canned {
        method2response: BTreeMap<String, Value>,
        sent: Arc<Mutex<Vec<(String, Value)>>>,
    }

    impl Canned {
        fn respond(mut self, method: impl Into<String>, response: impl Serialize) -> Self {
            self.method2response.insert(
                method.into(),
                serde_json::to_value(response).expect("serialization failure"),
            );
            self
        }

        fn sent(&self) -> Vec<(String, Value)> {
            self.sent.lock().unwrap().clone()
        }

        fn into_provider(self) -> RootProvider<BoxTransport> {
            RootProvider::connect_boxed(self)
                .now_or_never()
                .expect("Canned::get_transport is non blocking")
                .expect("Canned::get_transport is infallible")
        }
    }

    impl TransportConnect for Canned {
        type Transport = Self;
        fn is_local(&self) -> bool {
            true
        }
        fn get_transport<'a: 'b, 'b>(
            &'a self,
        ) -> BoxFuture<'b, Result<Self::Transport, TransportError>> {
            ready(Ok(self.clone())).boxed()
        }
    }

    impl Service<RequestPacket> for Canned {
        type Response = ResponsePacket;
        type Error = TransportError;
        type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;
        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: RequestPacket) -> Self::Future {
            fn error(message: impl Into<Cow<'static, str>>) -> TransportError {
                TransportError::ErrorResp(ErrorPayload {
                    code: 0,
                    message: message.into(),
                    data: None,
                })
            }

            let RequestPacket::Single(it) = req else {
                return ready(Err(error("batched messages are not supported"))).boxed();
            };
            let mut sent: Value = serde_json::from_str(it.serialized().get()).unwrap();
            let params = sent["params"].take();
            let (RequestMeta { method, id, .. }, _params) = it.decompose();
            self.sent.lock().unwrap().push((method.to_string(), params));
            ready(
                self.method2response
                    .get(&*method)
                    .map(|it| {
                        ResponsePacket::Single(Response {
                            id,
                            payload: ResponsePayload::Success(
                                serde_json::value::to_raw_value(it).unwrap(),
                            ),
                        })
                    })
                    .ok_or_else(|| error(format!("method {method} not implemented"))),
            )
            .boxed()
        }
    }

    fn block() -> BlockContext {
        BlockContext {
            block_number: 12,
            block_time: 1_700_000_012,
            block_hash: Default::default(),
            proposer_address: Bytes::from_static(&[0xaa; 20]),
            chain_id: CHAIN_ID,
            block_max_gas: -1,
        }
    }

    #[tokio::test]
    async fn block_trace_is_sent_with_hex_snapshot() {
        let canned = Canned::default().respond(TRACE_BLOCK_METHOD, json!([{ "result": {} }]));
        let engine = RpcReplayEngine::<_, BoxTransport>::new(canned.clone().into_provider());
        let request = TraceRequest::block(Vec::new(), block(), None);

        let bytes = engine
            .trace_block(ReplayContext::for_block(12), &request)
            .await
            .unwrap();
        check!(serde_json::from_slice::<Value>(&bytes).unwrap() == json!([{ "result": {} }]));

        let sent = canned.sent();
        let_assert!([(method, params)] = &sent[..]);
        check!(method == TRACE_BLOCK_METHOD);
        check!(params[1] == json!("0xb"));
        check!(params[0]["kind"] == json!("block"));
        check!(params[0]["blockNumber"] == json!(12));
        let_assert!(Ok(decoded) = serde_json::from_value::<TraceRequest>(params[0].clone()));
        let_assert!(TraceTargets::Block { txs } = decoded.targets);
        check!(txs.is_empty());
    }

    #[tokio::test]
    async fn node_errors_carry_the_method() {
        let provider = Canned::default().into_provider();
        let engine = RpcReplayEngine::<_, BoxTransport>::new(provider);
        let request = TraceRequest::block(Vec::new(), block(), None);
        let_assert!(
            Err(e) = engine
                .trace_call(ReplayContext::for_block(1), &request)
                .await
        );
        check!(e.to_string() == "evm_traceCall at snapshot 1");
    }
}
