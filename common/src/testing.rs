//! Deterministic keys, signed transactions and envelopes for test suites.

use alloy::consensus::{
    SignableTransaction, Signed, TxEip1559, TxEip2930, TxEnvelope, TxLegacy,
};
use alloy::primitives::{Address, Bytes, Signature, TxKind, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync as _;

use crate::{Envelope, EnvelopeCodec as _, EthereumTxMsg, Msg, NativeMsg, RlpEnvelopeCodec};

pub const CHAIN_ID: u64 = 7000;

/// Type URL used for opaque native messages in tests.
pub const BANK_SEND_TYPE_URL: &str = "/bank.v1.MsgSend";

/// A signer whose secret key is `seed` repeated 32 times.
pub fn signer(seed: u8) -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&B256::repeat_byte(seed)).expect("valid secret key")
}

fn recipient() -> TxKind {
    TxKind::Call(Address::repeat_byte(0xaa))
}

fn sign<T>(signer: &PrivateKeySigner, tx: T) -> TxEnvelope
where
    T: SignableTransaction<Signature>,
    TxEnvelope: From<Signed<T>>,
{
    let signature = signer
        .sign_hash_sync(&tx.signature_hash())
        .expect("signing a prehash");
    tx.into_signed(signature).into()
}

/// A legacy transfer. `chain_id: None` produces a pre-EIP-155 signature.
pub fn legacy_tx(signer: &PrivateKeySigner, chain_id: Option<u64>, nonce: u64) -> TxEnvelope {
    sign(
        signer,
        TxLegacy {
            chain_id,
            nonce,
            gas_price: 1_000_000_000,
            gas_limit: 21_000,
            to: recipient(),
            value: U256::from(1),
            input: Bytes::new(),
        },
    )
}

pub fn eip2930_tx(signer: &PrivateKeySigner, chain_id: u64, nonce: u64) -> TxEnvelope {
    sign(
        signer,
        TxEip2930 {
            chain_id,
            nonce,
            gas_price: 1_000_000_000,
            gas_limit: 30_000,
            to: recipient(),
            value: U256::from(2),
            ..Default::default()
        },
    )
}

pub fn eip1559_tx(signer: &PrivateKeySigner, chain_id: u64, nonce: u64) -> TxEnvelope {
    sign(
        signer,
        TxEip1559 {
            chain_id,
            nonce,
            gas_limit: 21_000,
            max_fee_per_gas: 2_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
            to: recipient(),
            value: U256::from(3),
            ..Default::default()
        },
    )
}

pub fn eth_msg(tx: &TxEnvelope) -> Msg {
    Msg::Ethereum(EthereumTxMsg::from_envelope(tx))
}

pub fn native_msg(payload: &[u8]) -> Msg {
    Msg::Native(NativeMsg {
        type_url: BANK_SEND_TYPE_URL.to_owned(),
        value: Bytes::copy_from_slice(payload),
    })
}

pub fn envelope(messages: Vec<Msg>) -> Envelope {
    Envelope {
        messages,
        gas_limit: 100_000,
        memo: String::new(),
    }
}

/// Encodes `messages` as a ledger transaction with [`RlpEnvelopeCodec`].
pub fn encoded_envelope(messages: Vec<Msg>) -> Bytes {
    RlpEnvelopeCodec.encode(&envelope(messages)).into()
}
