//! Types shared by the pre-execution checks (`evm_ante`) and the historical
//! trace pipeline (`trace_replay`).
//!
//! A ledger transaction is a signed [`Envelope`] holding one or more
//! [`Msg`]s. Exactly one kind of message matters to the EVM: the
//! [`EthereumTxMsg`], which wraps a raw EIP-2718 encoded Ethereum transaction.
//! Everything else is carried around as an opaque [`NativeMsg`].

pub mod block;
pub mod codec;
pub mod envelope;
pub mod eth_msg;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use block::{envelope_hash, BlockRecord, ConsensusParams, TxLocation};
pub use codec::{DecodeError, EnvelopeCodec, RlpEnvelopeCodec};
pub use envelope::{Envelope, Msg, NativeMsg};
pub use eth_msg::{EthereumTxMsg, TxDecodeError, MSG_ETHEREUM_TX_TYPE_URL};

/// The largest number of transactions a block may be indexed with.
///
/// Transaction positions are stored as `u32`, so anything larger can not be
/// addressed and must be rejected rather than truncated.
const MAX_TX_COUNT: usize = u32::MAX as usize;

/// Checks that `count` transactions can be addressed with a `u32` index.
pub fn checked_tx_count(count: usize) -> Option<u32> {
    (count <= MAX_TX_COUNT).then(|| count as u32)
}

#[test]
fn test_checked_tx_count() {
    assert_eq!(checked_tx_count(0), Some(0));
    assert_eq!(checked_tx_count(MAX_TX_COUNT), Some(u32::MAX));
    #[cfg(target_pointer_width = "64")]
    assert_eq!(checked_tx_count(MAX_TX_COUNT + 1), None);
}
