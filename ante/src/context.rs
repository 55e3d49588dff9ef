//! The validation context threaded through the decorator chain.

use thiserror::Error;

/// Per-operation gas costs of a key/value store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GasConfig {
    pub has_cost: u64,
    pub delete_cost: u64,
    pub read_cost_flat: u64,
    pub read_cost_per_byte: u64,
    pub write_cost_flat: u64,
    pub write_cost_per_byte: u64,
    pub iter_next_cost_flat: u64,
}

impl GasConfig {
    /// Costs charged by the native ledger for persistent stores.
    pub const KV: Self = Self {
        has_cost: 1000,
        delete_cost: 1000,
        read_cost_flat: 1000,
        read_cost_per_byte: 3,
        write_cost_flat: 2000,
        write_cost_per_byte: 30,
        iter_next_cost_flat: 30,
    };

    /// Costs charged by the native ledger for transient stores.
    pub const TRANSIENT_KV: Self = Self {
        has_cost: 100,
        delete_cost: 100,
        read_cost_flat: 100,
        read_cost_per_byte: 0,
        write_cost_flat: 200,
        write_cost_per_byte: 3,
        iter_next_cost_flat: 3,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("out of gas: limit {limit}, wanted {wanted}")]
pub struct OutOfGas {
    pub limit: u64,
    pub wanted: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GasMeter {
    Limited { limit: u64, consumed: u64 },
    /// Tracks consumption but never fails.
    Infinite { consumed: u64 },
}

impl GasMeter {
    pub fn limited(limit: u64) -> Self {
        Self::Limited { limit, consumed: 0 }
    }

    pub fn infinite() -> Self {
        Self::Infinite { consumed: 0 }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite { .. })
    }

    pub fn consumed(&self) -> u64 {
        match self {
            Self::Limited { consumed, .. } | Self::Infinite { consumed } => *consumed,
        }
    }

    pub fn consume(&mut self, amount: u64) -> Result<(), OutOfGas> {
        match self {
            Self::Limited { limit, consumed } => {
                let wanted = consumed.saturating_add(amount);
                if wanted > *limit {
                    return Err(OutOfGas {
                        limit: *limit,
                        wanted,
                    });
                }
                *consumed = wanted;
            }
            Self::Infinite { consumed } => *consumed = consumed.saturating_add(amount),
        }
        Ok(())
    }
}

/// State visible to every decorator.
///
/// Decorators never mutate a context in place: each one hands a (possibly
/// modified) copy to the rest of the chain, so concurrent validations can
/// not observe each other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnteContext {
    pub chain_id: u64,
    pub block_height: u64,
    /// Block time as unix seconds.
    pub block_time: u64,
    pub gas_meter: GasMeter,
    pub kv_gas_config: GasConfig,
    pub transient_kv_gas_config: GasConfig,
    pub is_check_tx: bool,
    pub is_recheck_tx: bool,
}

impl AnteContext {
    /// A delivery context with native gas accounting in place.
    pub fn new(chain_id: u64, block_height: u64, block_time: u64, gas_limit: u64) -> Self {
        Self {
            chain_id,
            block_height,
            block_time,
            gas_meter: GasMeter::limited(gas_limit),
            kv_gas_config: GasConfig::KV,
            transient_kv_gas_config: GasConfig::TRANSIENT_KV,
            is_check_tx: false,
            is_recheck_tx: false,
        }
    }

    pub fn with_gas_meter(self, gas_meter: GasMeter) -> Self {
        Self { gas_meter, ..self }
    }

    pub fn with_kv_gas_config(self, kv_gas_config: GasConfig) -> Self {
        Self {
            kv_gas_config,
            ..self
        }
    }

    pub fn with_transient_kv_gas_config(self, transient_kv_gas_config: GasConfig) -> Self {
        Self {
            transient_kv_gas_config,
            ..self
        }
    }

    pub fn with_check_tx(self, is_check_tx: bool) -> Self {
        Self {
            is_check_tx,
            ..self
        }
    }

    pub fn with_recheck_tx(self, is_recheck_tx: bool) -> Self {
        Self {
            is_recheck_tx,
            ..self
        }
    }
}
