//! Turning stored ledger transaction bytes into [`Envelope`]s.

use rlp::{DecoderError, Rlp};
use thiserror::Error;

use crate::envelope::Envelope;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty transaction bytes")]
    Empty,
    #[error("invalid envelope encoding: {0}")]
    Rlp(#[from] DecoderError),
    #[error("{0} trailing bytes after envelope")]
    TrailingBytes(usize),
    #[error("envelope carries no messages")]
    NoMessages,
}

/// Decodes raw ledger transactions.
///
/// The trace pipeline is generic over this so that a ledger with a different
/// wire format can be plugged in without touching the walk logic.
pub trait EnvelopeCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Envelope, DecodeError>;

    fn encode(&self, envelope: &Envelope) -> Vec<u8>;
}

/// The default RLP wire format, see the [`rlp::Encodable`] impl on
/// [`Envelope`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RlpEnvelopeCodec;

impl EnvelopeCodec for RlpEnvelopeCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Envelope, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let rlp = Rlp::new(bytes);
        let consumed = rlp.payload_info()?.total();
        if consumed < bytes.len() {
            return Err(DecodeError::TrailingBytes(bytes.len() - consumed));
        }
        let envelope: Envelope = rlp.as_val()?;
        if envelope.messages.is_empty() {
            return Err(DecodeError::NoMessages);
        }
        Ok(envelope)
    }

    fn encode(&self, envelope: &Envelope) -> Vec<u8> {
        rlp::encode(envelope).to_vec()
    }
}
