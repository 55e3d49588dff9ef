use evm_replay_common::Msg;
use tracing::debug;

use crate::context::AnteContext;
use crate::error::{AnteError, AnteResult};
use crate::handler::{AnteDecorator, AnteTx, Next};
use crate::signer::{ForkSchedule, SignerScheme};

/// Checks every message signature and fills in the sender slots.
///
/// Runs on check, recheck and simulation passes alike: later steps read the
/// sender even for transactions that will never be committed. Senders are
/// recovered for all messages before any slot is written, so a failing
/// envelope is left exactly as it came in.
#[derive(Clone, Copy, Debug)]
pub struct EthSigVerificationDecorator {
    forks: ForkSchedule,
}

impl EthSigVerificationDecorator {
    pub fn new(forks: ForkSchedule) -> Self {
        Self { forks }
    }
}

impl AnteDecorator for EthSigVerificationDecorator {
    fn ante_handle(
        &self,
        ctx: AnteContext,
        tx: &mut dyn AnteTx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<AnteContext> {
        let scheme = SignerScheme::select(
            &self.forks,
            ctx.chain_id,
            ctx.block_height,
            ctx.block_time,
        );

        let senders = tx
            .msgs()
            .iter()
            .enumerate()
            .map(|(index, msg)| {
                let Msg::Ethereum(eth) = msg else {
                    return Err(AnteError::InvalidEnvelopeType {
                        index,
                        type_url: msg.type_url().to_owned(),
                    });
                };
                scheme
                    .recover_sender(eth)
                    .map_err(|source| AnteError::SignerRecoveryFailed { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (msg, sender) in tx.msgs_mut().iter_mut().zip(senders) {
            if let Some(eth) = msg.as_ethereum_mut() {
                debug!(hash = %eth.hash(), %sender, ?scheme, "recovered sender");
                eth.set_sender(sender);
            }
        }

        next.run(ctx, tx, simulate)
    }
}
