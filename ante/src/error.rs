use thiserror::Error;

use crate::signer::RecoveryError;

pub type AnteResult<T> = Result<T, AnteError>;

#[derive(Debug, Error)]
pub enum AnteError {
    /// The transaction does not declare its own gas limit.
    #[error("invalid transaction type {type_name}, expected a gas-limited transaction")]
    InvalidTxType { type_name: &'static str },
    #[error("invalid message type {type_url} at index {index}, expected an ethereum transaction")]
    InvalidEnvelopeType { index: usize, type_url: String },
    #[error("couldn't retrieve sender address of message {index}")]
    SignerRecoveryFailed {
        index: usize,
        #[source]
        source: RecoveryError,
    },
}
