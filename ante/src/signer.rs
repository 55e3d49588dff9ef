//! Signing scheme selection and sender recovery.
//!
//! Which transactions a chain accepts, and how their signatures are checked,
//! changes at fork boundaries. [`SignerScheme::select`] picks the scheme in
//! force for a given block, and [`SignerScheme::recover`] applies it.

use alloy::consensus::{SignableTransaction, Signed, Transaction, TxEnvelope};
use alloy::primitives::{uint, Address, Signature, SignatureError, U256};
use evm_replay_common::{EthereumTxMsg, TxDecodeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Half the secp256k1 group order. Homestead and later reject signatures
/// with `s` above this value.
pub const SECP256K1N_HALF: U256 =
    uint!(0x7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0_U256);

/// Activation points of the forks that change transaction signing.
///
/// Block-numbered forks activate at the given height, Cancun at the given
/// block time. `None` means never.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForkSchedule {
    pub homestead_block: Option<u64>,
    pub eip155_block: Option<u64>,
    pub berlin_block: Option<u64>,
    pub london_block: Option<u64>,
    pub cancun_time: Option<u64>,
}

impl ForkSchedule {
    /// Every fork active from genesis.
    pub fn all_active() -> Self {
        Self {
            homestead_block: Some(0),
            eip155_block: Some(0),
            berlin_block: Some(0),
            london_block: Some(0),
            cancun_time: Some(0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignerScheme {
    Frontier,
    Homestead,
    Eip155 { chain_id: u64 },
    Berlin { chain_id: u64 },
    London { chain_id: u64 },
    Cancun { chain_id: u64 },
}

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error(transparent)]
    Decode(#[from] TxDecodeError),
    #[error("transaction type {tx_type} is not supported by the {scheme:?} signer")]
    UnsupportedTxType { tx_type: u8, scheme: SignerScheme },
    #[error("invalid chain id for signer: have {got}, want {expected}")]
    ChainIdMismatch { expected: u64, got: u64 },
    #[error("replay-protected transaction before EIP-155 activation")]
    ProtectedBeforeEip155,
    #[error("invalid signature: s value in the upper half of the curve order")]
    HighS,
    #[error("invalid signature: {0}")]
    Signature(#[from] SignatureError),
}

impl SignerScheme {
    /// The newest scheme active at `height` and `time`.
    pub fn select(forks: &ForkSchedule, chain_id: u64, height: u64, time: u64) -> Self {
        let reached = |block: Option<u64>| block.is_some_and(|block| height >= block);
        if forks.cancun_time.is_some_and(|cancun| time >= cancun) {
            Self::Cancun { chain_id }
        } else if reached(forks.london_block) {
            Self::London { chain_id }
        } else if reached(forks.berlin_block) {
            Self::Berlin { chain_id }
        } else if reached(forks.eip155_block) {
            Self::Eip155 { chain_id }
        } else if reached(forks.homestead_block) {
            Self::Homestead
        } else {
            Self::Frontier
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        match *self {
            Self::Frontier | Self::Homestead => None,
            Self::Eip155 { chain_id }
            | Self::Berlin { chain_id }
            | Self::London { chain_id }
            | Self::Cancun { chain_id } => Some(chain_id),
        }
    }

    /// Highest EIP-2718 transaction type accepted.
    pub fn max_tx_type(&self) -> u8 {
        match self {
            Self::Frontier | Self::Homestead | Self::Eip155 { .. } => 0,
            Self::Berlin { .. } => 1,
            Self::London { .. } => 2,
            Self::Cancun { .. } => 3,
        }
    }

    fn allows_high_s(&self) -> bool {
        matches!(self, Self::Frontier)
    }

    /// Decodes the raw transaction of `msg` and recovers its sender.
    pub fn recover_sender(&self, msg: &EthereumTxMsg) -> Result<Address, RecoveryError> {
        self.recover(&msg.decode_tx()?)
    }

    pub fn recover(&self, tx: &TxEnvelope) -> Result<Address, RecoveryError> {
        let tx_type = tx.tx_type() as u8;
        if tx_type > self.max_tx_type() {
            return Err(RecoveryError::UnsupportedTxType {
                tx_type,
                scheme: *self,
            });
        }
        match tx {
            TxEnvelope::Legacy(signed) => self.recover_signed(signed),
            TxEnvelope::Eip2930(signed) => self.recover_signed(signed),
            TxEnvelope::Eip1559(signed) => self.recover_signed(signed),
            TxEnvelope::Eip4844(signed) => self.recover_signed(signed),
            _ => Err(RecoveryError::UnsupportedTxType {
                tx_type,
                scheme: *self,
            }),
        }
    }

    fn recover_signed<T>(&self, signed: &Signed<T>) -> Result<Address, RecoveryError>
    where
        T: SignableTransaction<Signature> + Transaction,
    {
        self.check_chain_id(signed.tx().chain_id())?;
        let signature = signed.signature();
        if !self.allows_high_s() {
            check_low_s(signature.s())?;
        }
        let prehash = signed.tx().signature_hash();
        Ok(signature.recover_address_from_prehash(&prehash)?)
    }

    // Typed transactions always carry a chain id; only legacy ones may omit it.
    fn check_chain_id(&self, tx_chain_id: Option<u64>) -> Result<(), RecoveryError> {
        match (self.chain_id(), tx_chain_id) {
            (_, None) => Ok(()),
            (None, Some(_)) => Err(RecoveryError::ProtectedBeforeEip155),
            (Some(expected), Some(got)) if expected != got => {
                Err(RecoveryError::ChainIdMismatch { expected, got })
            }
            (Some(_), Some(_)) => Ok(()),
        }
    }
}

pub fn check_low_s(s: U256) -> Result<(), RecoveryError> {
    match s > SECP256K1N_HALF {
        true => Err(RecoveryError::HighS),
        false => Ok(()),
    }
}
