//! Pre-execution checks for Ethereum-style ledger transactions.
//!
//! Every inbound envelope goes through an [`AnteHandler`], an ordered chain of
//! [`AnteDecorator`]s. For Ethereum-style transactions the chain is fixed, see
//! [`eth_ante_handler`]:
//!
//! 1. [`EthSetupContextDecorator`] turns native gas metering off, since the
//!    EVM does its own gas accounting.
//! 2. [`EthSigVerificationDecorator`] recovers the sender of every message
//!    under the [`SignerScheme`] in force for the block and records it.

mod context;
mod error;
mod handler;
mod setup_ctx;
pub mod signer;
mod sigverify;

pub use context::{AnteContext, GasConfig, GasMeter, OutOfGas};
pub use error::{AnteError, AnteResult};
pub use handler::{
    eth_ante_handler, AnteDecorator, AnteHandler, AnteHandlerBuilder, AnteTx, GasTx, Next,
};
pub use setup_ctx::EthSetupContextDecorator;
pub use signer::{ForkSchedule, RecoveryError, SignerScheme};
pub use sigverify::EthSigVerificationDecorator;
