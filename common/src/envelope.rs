//! The ledger transaction envelope and the messages it carries.

use alloy::primitives::Bytes;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};

use crate::eth_msg::{EthereumTxMsg, MSG_ETHEREUM_TX_TYPE_URL};

/// Any message that is not an Ethereum transaction, kept as packed bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeMsg {
    pub type_url: String,
    pub value: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Msg {
    Ethereum(EthereumTxMsg),
    Native(NativeMsg),
}

impl Msg {
    pub fn type_url(&self) -> &str {
        match self {
            Msg::Ethereum(_) => MSG_ETHEREUM_TX_TYPE_URL,
            Msg::Native(native) => &native.type_url,
        }
    }

    pub fn as_ethereum(&self) -> Option<&EthereumTxMsg> {
        match self {
            Msg::Ethereum(msg) => Some(msg),
            Msg::Native(_) => None,
        }
    }

    pub fn as_ethereum_mut(&mut self) -> Option<&mut EthereumTxMsg> {
        match self {
            Msg::Ethereum(msg) => Some(msg),
            Msg::Native(_) => None,
        }
    }

    pub fn into_ethereum(self) -> Option<EthereumTxMsg> {
        match self {
            Msg::Ethereum(msg) => Some(msg),
            Msg::Native(_) => None,
        }
    }
}

/// A signed ledger transaction.
///
/// Message order is significant: the position of a message inside
/// [`Envelope::messages`] is the `msg_index` recorded by the ledger index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub messages: Vec<Msg>,
    pub gas_limit: u64,
    pub memo: String,
}

impl Envelope {
    /// Ethereum messages in envelope order.
    pub fn ethereum_msgs(&self) -> impl Iterator<Item = &EthereumTxMsg> + '_ {
        self.messages.iter().filter_map(Msg::as_ethereum)
    }
}

// Wire layout: `[type_url, value]`. For Ethereum messages `value` is the raw
// EIP-2718 transaction; the recovered sender never goes on the wire.
impl Encodable for Msg {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.encoder().encode_value(self.type_url().as_bytes());
        match self {
            Msg::Ethereum(msg) => s.encoder().encode_value(&msg.raw),
            Msg::Native(native) => s.encoder().encode_value(&native.value),
        }
    }
}

impl Decodable for Msg {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let type_url: String = rlp.val_at(0)?;
        let value: Vec<u8> = rlp.val_at(1)?;
        Ok(if type_url == MSG_ETHEREUM_TX_TYPE_URL {
            Msg::Ethereum(EthereumTxMsg::new(value))
        } else {
            Msg::Native(NativeMsg {
                type_url,
                value: value.into(),
            })
        })
    }
}

// Wire layout: `[[msg, ...], gas_limit, memo]`.
impl Encodable for Envelope {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.begin_list(self.messages.len());
        for msg in &self.messages {
            s.append(msg);
        }
        s.append(&self.gas_limit);
        s.encoder().encode_value(self.memo.as_bytes());
    }
}

impl Decodable for Envelope {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            messages: rlp.list_at(0)?,
            gas_limit: rlp.val_at(1)?,
            memo: rlp.val_at(2)?,
        })
    }
}
