//! Runs the Ethereum ante chain over a raw ledger transaction.

use alloy::primitives::Address;
use anyhow::Context as _;
use evm_ante::{eth_ante_handler, AnteContext, ForkSchedule};
use evm_replay_common::{Envelope, EnvelopeCodec as _, RlpEnvelopeCodec};
use serde::Serialize;

/// What the ante chain left behind for one envelope.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// One per message, in order.
    pub senders: Vec<Address>,
    pub gas_limit: u64,
    pub infinite_gas_meter: bool,
    pub envelope: Envelope,
}

/// Decodes `raw` and validates it as a delivered transaction at `height`.
pub fn check_envelope(
    raw: &[u8],
    chain_id: u64,
    forks: ForkSchedule,
    height: u64,
    time: u64,
) -> anyhow::Result<CheckReport> {
    let mut envelope = RlpEnvelopeCodec
        .decode(raw)
        .context("decoding ledger transaction")?;
    let gas_limit = envelope.gas_limit;
    let ctx = AnteContext::new(chain_id, height, time, gas_limit);
    let ctx = eth_ante_handler(forks).handle(ctx, &mut envelope, false)?;

    let senders = envelope
        .ethereum_msgs()
        .filter_map(|msg| msg.from)
        .collect();
    Ok(CheckReport {
        senders,
        gas_limit,
        infinite_gas_meter: ctx.gas_meter.is_infinite(),
        envelope,
    })
}
