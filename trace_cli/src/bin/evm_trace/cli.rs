use std::path::PathBuf;

use alloy::primitives::{Bytes, B256};
use alloy::rpc::types::trace::geth::GethDebugTracingOptions;
use alloy::rpc::types::TransactionRequest;
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use serde::de::DeserializeOwned;
use url::Url;

/// Historical EVM trace replay against a ledger fixture
#[derive(Parser)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,

    /// JSON file with the chain id, fork schedule, consensus params and
    /// committed blocks.
    #[arg(short, long, env = "EVM_TRACE_LEDGER", value_hint = ValueHint::FilePath)]
    pub(crate) ledger: PathBuf,

    /// The replay node. Needed by the trace commands unless `--dry-run` is
    /// given.
    #[arg(short = 'u', long, env = "EVM_TRACE_RPC_URL", value_hint = ValueHint::Url)]
    pub(crate) rpc_url: Option<Url>,

    /// Pause before the first retry of a failed request, doubled after every
    /// further attempt.
    #[arg(long, env = "EVM_TRACE_BACKOFF", default_value_t = 250)]
    pub(crate) backoff_ms: u64,

    #[arg(long, env = "EVM_TRACE_MAX_RETRIES", default_value_t = 3)]
    pub(crate) max_retries: u32,

    /// Print the request the replay node would receive instead of sending it.
    #[arg(long)]
    pub(crate) dry_run: bool,

    /// More logging on stderr. Repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    pub(crate) verbose: u8,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    #[command(flatten)]
    Trace(TraceCommand),
    /// Run the ante chain over a hex encoded ledger transaction and print the
    /// recovered senders.
    Check {
        envelope: Bytes,
        #[arg(long, default_value_t = 1)]
        height: u64,
        /// Block time as unix seconds.
        #[arg(long, default_value_t = 0)]
        time: u64,
    },
}

#[derive(Subcommand)]
pub(crate) enum TraceCommand {
    /// Trace one Ethereum transaction by hash.
    Tx {
        hash: B256,
        /// Tracer options as JSON, e.g. `{"tracer":"callTracer"}`.
        #[arg(short, long, value_parser = parse_json::<GethDebugTracingOptions>)]
        tracer_config: Option<GethDebugTracingOptions>,
    },
    /// Trace every transaction of a block.
    Block {
        height: u64,
        #[arg(short, long, value_parser = parse_json::<GethDebugTracingOptions>)]
        tracer_config: Option<GethDebugTracingOptions>,
    },
    /// Trace a call on top of the state a block started from.
    Call {
        #[arg(short, long)]
        block: u64,
        /// The call as an `eth_call` transaction object.
        #[arg(value_parser = parse_json::<TransactionRequest>)]
        call: TransactionRequest,
        #[arg(short, long, value_parser = parse_json::<GethDebugTracingOptions>)]
        tracer_config: Option<GethDebugTracingOptions>,
    },
}

fn parse_json<T: DeserializeOwned>(
    s: &str,
) -> Result<T, serde_path_to_error::Error<serde_json::Error>> {
    serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(s))
}
