//! The Ethereum-style message carried inside an [`Envelope`](crate::Envelope).

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::{Decodable2718 as _, Encodable2718 as _};
use alloy::primitives::{keccak256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type URL under which Ethereum transactions are packed into an envelope.
pub const MSG_ETHEREUM_TX_TYPE_URL: &str = "/eth.evm.v1.MsgEthereumTx";

/// A raw Ethereum transaction embedded in a ledger envelope.
///
/// The sender is not part of the wire encoding. It starts out unset and is
/// filled in exactly once the signature has been checked, see
/// [`EthereumTxMsg::set_sender`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthereumTxMsg {
    /// EIP-2718 encoding of the signed transaction.
    pub raw: Bytes,
    /// Address recovered from the transaction signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
}

/// The raw bytes of an [`EthereumTxMsg`] are not a valid transaction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TxDecodeError {
    #[error("malformed ethereum transaction: {0}")]
    Malformed(String),
    #[error("{0} trailing bytes after ethereum transaction")]
    TrailingBytes(usize),
}

impl EthereumTxMsg {
    /// Wraps an already encoded transaction. The sender is left unset.
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Self {
            raw: raw.into(),
            from: None,
        }
    }

    pub fn from_envelope(tx: &TxEnvelope) -> Self {
        Self::new(tx.encoded_2718())
    }

    /// The Ethereum transaction hash, `keccak256` of the EIP-2718 encoding.
    pub fn hash(&self) -> B256 {
        keccak256(&self.raw)
    }

    /// Parses the raw bytes. The whole buffer must be consumed.
    pub fn decode_tx(&self) -> Result<TxEnvelope, TxDecodeError> {
        let mut buf = self.raw.as_ref();
        let tx = TxEnvelope::decode_2718(&mut buf)
            .map_err(|e| TxDecodeError::Malformed(e.to_string()))?;
        match buf.len() {
            0 => Ok(tx),
            remaining => Err(TxDecodeError::TrailingBytes(remaining)),
        }
    }

    /// Fills in the sender slot.
    ///
    /// Writing the same sender twice is a no-op, so a message that already
    /// went through signature verification can go through it again.
    pub fn set_sender(&mut self, from: Address) {
        self.from = Some(from);
    }
}
