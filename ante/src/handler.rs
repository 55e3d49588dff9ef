//! Chain-of-responsibility plumbing for pre-execution checks.

use evm_replay_common::{Envelope, Msg};

use crate::context::AnteContext;
use crate::error::AnteResult;
use crate::setup_ctx::EthSetupContextDecorator;
use crate::signer::ForkSchedule;
use crate::sigverify::EthSigVerificationDecorator;

/// A transaction that declares its own gas limit.
pub trait GasTx {
    fn gas(&self) -> u64;
}

/// What a decorator gets to see of the transaction being validated.
pub trait AnteTx {
    fn msgs(&self) -> &[Msg];

    fn msgs_mut(&mut self) -> &mut [Msg];

    /// `Some` if the transaction carries its own gas limit.
    fn as_gas_tx(&self) -> Option<&dyn GasTx> {
        None
    }

    /// Used in error messages only.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl GasTx for Envelope {
    fn gas(&self) -> u64 {
        self.gas_limit
    }
}

impl AnteTx for Envelope {
    fn msgs(&self) -> &[Msg] {
        &self.messages
    }

    fn msgs_mut(&mut self) -> &mut [Msg] {
        &mut self.messages
    }

    fn as_gas_tx(&self) -> Option<&dyn GasTx> {
        Some(self)
    }
}

/// One step of the chain.
///
/// A decorator either fails, which ends the chain, or hands a context on to
/// `next`. It may also return without calling `next` to cut the chain short.
pub trait AnteDecorator: Send + Sync {
    fn ante_handle(
        &self,
        ctx: AnteContext,
        tx: &mut dyn AnteTx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<AnteContext>;
}

/// The decorators after the current one.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Box<dyn AnteDecorator>],
}

impl Next<'_> {
    pub fn run(
        self,
        ctx: AnteContext,
        tx: &mut dyn AnteTx,
        simulate: bool,
    ) -> AnteResult<AnteContext> {
        match self.rest.split_first() {
            Some((head, rest)) => head.ante_handle(ctx, tx, simulate, Next { rest }),
            None => Ok(ctx),
        }
    }
}

/// An ordered, immutable decorator chain.
pub struct AnteHandler {
    decorators: Vec<Box<dyn AnteDecorator>>,
}

impl AnteHandler {
    pub fn builder() -> AnteHandlerBuilder {
        AnteHandlerBuilder::default()
    }

    /// Runs the whole chain for one transaction, returning the context the
    /// last decorator produced.
    pub fn handle(
        &self,
        ctx: AnteContext,
        tx: &mut dyn AnteTx,
        simulate: bool,
    ) -> AnteResult<AnteContext> {
        Next {
            rest: &self.decorators,
        }
        .run(ctx, tx, simulate)
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }
}

#[derive(Default)]
pub struct AnteHandlerBuilder {
    decorators: Vec<Box<dyn AnteDecorator>>,
}

impl AnteHandlerBuilder {
    pub fn then(mut self, decorator: impl AnteDecorator + 'static) -> Self {
        self.decorators.push(Box::new(decorator));
        self
    }

    pub fn build(self) -> AnteHandler {
        AnteHandler {
            decorators: self.decorators,
        }
    }
}

/// The chain every Ethereum-style transaction goes through: the gas
/// accounting override first, then signature verification.
pub fn eth_ante_handler(forks: ForkSchedule) -> AnteHandler {
    AnteHandler::builder()
        .then(EthSetupContextDecorator)
        .then(EthSigVerificationDecorator::new(forks))
        .build()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use evm_replay_common::EthereumTxMsg;

    use super::*;
    use crate::error::AnteError;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    struct Record {
        name: &'static str,
        log: Log,
        fail: bool,
    }

    impl AnteDecorator for Record {
        fn ante_handle(
            &self,
            ctx: AnteContext,
            tx: &mut dyn AnteTx,
            simulate: bool,
            next: Next<'_>,
        ) -> AnteResult<AnteContext> {
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                return Err(AnteError::InvalidTxType {
                    type_name: tx.type_name(),
                });
            }
            next.run(ctx.with_check_tx(true), tx, simulate)
        }
    }

    fn record(name: &'static str, log: &Log, fail: bool) -> Record {
        Record {
            name,
            log: log.clone(),
            fail,
        }
    }

    #[test]
    fn runs_in_order_and_threads_context() {
        let log = Log::default();
        let handler = AnteHandler::builder()
            .then(record("a", &log, false))
            .then(record("b", &log, false))
            .build();
        let ctx = handler
            .handle(AnteContext::new(1, 1, 0, 0), &mut Envelope::default(), false)
            .unwrap();
        assert!(ctx.is_check_tx);
        assert_eq!(*log.lock().unwrap(), ["a", "b"]);
    }

    #[test]
    fn failure_stops_the_chain() {
        let log = Log::default();
        let handler = AnteHandler::builder()
            .then(record("a", &log, true))
            .then(record("b", &log, false))
            .build();
        let err = handler
            .handle(AnteContext::new(1, 1, 0, 0), &mut Envelope::default(), false)
            .unwrap_err();
        assert!(matches!(err, AnteError::InvalidTxType { .. }));
        assert_eq!(*log.lock().unwrap(), ["a"]);
    }

    #[test]
    fn empty_chain_returns_context_unchanged() {
        let handler = AnteHandler::builder().build();
        assert!(handler.is_empty());
        let ctx = AnteContext::new(1, 1, 0, 0);
        assert_eq!(
            handler.handle(ctx.clone(), &mut Envelope::default(), true).unwrap(),
            ctx
        );
    }

    /// Carries messages but no gas limit of its own.
    struct NoGasTx(Vec<Msg>);

    impl AnteTx for NoGasTx {
        fn msgs(&self) -> &[Msg] {
            &self.0
        }

        fn msgs_mut(&mut self) -> &mut [Msg] {
            &mut self.0
        }
    }

    #[test]
    fn eth_chain_has_both_decorators() {
        assert_eq!(eth_ante_handler(ForkSchedule::all_active()).len(), 2);
    }

    #[test]
    fn eth_chain_checks_gas_capability_before_signatures() {
        // The payload would fail signer recovery, so only the gas check can
        // produce `InvalidTxType`.
        let mut tx = NoGasTx(vec![Msg::Ethereum(EthereumTxMsg::new(vec![0x02, 0xc0]))]);
        let err = eth_ante_handler(ForkSchedule::all_active())
            .handle(AnteContext::new(1, 1, 0, 0), &mut tx, false)
            .unwrap_err();
        assert!(matches!(err, AnteError::InvalidTxType { .. }), "{err}");
        assert!(tx.0[0].as_ethereum().is_some_and(|eth| eth.from.is_none()));
    }
}
