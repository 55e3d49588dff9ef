use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use alloy::{
    providers::{ProviderBuilder, RootProvider},
    rpc::{
        client::ClientBuilder,
        json_rpc::{RequestPacket, ResponsePacket},
    },
    transports::{http::ReqwestTransport, RpcError, TransportError},
};
use tower::{retry::Policy, Layer, Service};
use tracing::warn;

/// Longest pause between two attempts, however many retries came before.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retries requests that never got an answer from the replay node.
///
/// An error response is final: the node executed the replay and rejected it,
/// and asking again would replay the same state. The pause doubles after
/// every attempt.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    backoff: Duration,
    retries: u32,
    max_retries: u32,
}

impl RetryPolicy {
    pub fn new(backoff: Duration, max_retries: u32) -> Self {
        Self {
            backoff,
            retries: 0,
            max_retries,
        }
    }

    fn next_backoff(&self) -> Duration {
        self.backoff
            .checked_mul(1 << self.retries.min(16))
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }

    fn should_retry(&self, result: Result<&ResponsePacket, &TransportError>) -> bool {
        matches!(result, Err(RpcError::Transport(_))) && self.retries < self.max_retries
    }
}

impl Policy<RequestPacket, ResponsePacket, TransportError> for RetryPolicy {
    type Future = Pin<Box<dyn Future<Output = Self> + Send + 'static>>;

    fn retry(
        &self,
        _req: &RequestPacket,
        result: Result<&ResponsePacket, &TransportError>,
    ) -> Option<Self::Future> {
        if !self.should_retry(result) {
            return None;
        }
        let mut policy = self.clone();
        let pause = self.next_backoff();
        if let Err(e) = result {
            warn!(attempt = policy.retries + 1, ?pause, "retrying replay request: {e}");
        }
        Some(Box::pin(async move {
            tokio::time::sleep(pause).await;
            policy.retries += 1;
            policy
        }))
    }

    fn clone_request(&self, req: &RequestPacket) -> Option<RequestPacket> {
        Some(req.clone())
    }
}

pub struct RetryLayer {
    policy: RetryPolicy,
}

impl RetryLayer {
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService {
            inner,
            policy: self.policy.clone(),
        }
    }
}

/// Replays a request on the inner transport for as long as the policy allows.
///
/// `call` takes the service that `poll_ready` was driven on and leaves a fresh
/// clone behind for the next request, since a clone has not been polled and
/// may not be ready yet.
#[derive(Debug, Clone)]
pub struct RetryService<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> Service<RequestPacket> for RetryService<S>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>
        + Send
        + 'static
        + Clone,
    S::Future: Send + 'static,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: RequestPacket) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let mut policy = self.policy.clone();

        Box::pin(async move {
            let mut res = inner.call(req.clone()).await;
            while let Some(next) = policy.retry(&req, res.as_ref()) {
                policy = next.await;
                res = inner.call(req.clone()).await;
            }
            res
        })
    }
}

/// An HTTP provider for the replay node that retries transport failures.
pub fn build_http_retry_provider(
    rpc_url: url::Url,
    backoff_ms: u64,
    max_retries: u32,
) -> RootProvider<RetryService<ReqwestTransport>> {
    let layer = RetryLayer::new(RetryPolicy::new(
        Duration::from_millis(backoff_ms),
        max_retries,
    ));
    let client = ClientBuilder::default().layer(layer).http(rpc_url);
    ProviderBuilder::new().on_client(client)
}
