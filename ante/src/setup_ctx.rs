use tracing::trace;

use crate::context::{AnteContext, GasConfig, GasMeter};
use crate::error::{AnteError, AnteResult};
use crate::handler::{AnteDecorator, AnteTx, Next};

/// Switches native gas accounting off.
///
/// Ethereum-style transactions pay for gas inside the EVM, so the ledger's
/// own meter is replaced with an infinite one and every store access is made
/// free. Must be the first decorator of the chain.
#[derive(Clone, Copy, Debug, Default)]
pub struct EthSetupContextDecorator;

impl AnteDecorator for EthSetupContextDecorator {
    fn ante_handle(
        &self,
        ctx: AnteContext,
        tx: &mut dyn AnteTx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<AnteContext> {
        let gas_tx = tx.as_gas_tx().ok_or(AnteError::InvalidTxType {
            type_name: tx.type_name(),
        })?;
        trace!(gas_limit = gas_tx.gas(), "disabling native gas metering");

        let ctx = ctx
            .with_gas_meter(GasMeter::infinite())
            .with_kv_gas_config(GasConfig::default())
            .with_transient_kv_gas_config(GasConfig::default());
        next.run(ctx, tx, simulate)
    }
}
