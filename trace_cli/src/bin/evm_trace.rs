use std::io::Write as _;

use alloy::transports::http::ReqwestTransport;
use anyhow::Context as _;
use clap::Parser as _;
use cli::{Cli, Command, TraceCommand};
use serde::Serialize;
use serde_json::json;
use trace_cli::check::check_envelope;
use trace_cli::env::load_dotenvy_vars_if_present;
use trace_cli::fixture::Fixture;
use trace_cli::rpc::retry::{build_http_retry_provider, RetryService};
use trace_cli::rpc::RpcReplayEngine;
use trace_replay::{InMemoryLedger, ReplayEngine, TraceApi};
use tracing::info;

#[path = "evm_trace/cli.rs"]
mod cli;

type LedgerApi<'a, R> = TraceApi<&'a InMemoryLedger, &'a InMemoryLedger, R>;

fn print(value: &impl Serialize) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Builds the request without contacting the replay node.
async fn dry_run(api: &LedgerApi<'_, ()>, command: TraceCommand) -> anyhow::Result<()> {
    let (context, request) = match command {
        TraceCommand::Tx {
            hash,
            tracer_config,
        } => {
            let prepared = api.prepare_transaction(hash, tracer_config).await?;
            (prepared.context, prepared.request)
        }
        TraceCommand::Block {
            height,
            tracer_config,
        } => match api.prepare_block(height, tracer_config).await? {
            Some(prepared) => (prepared.context, prepared.request),
            None => {
                info!(height, "block has no transactions, nothing to replay");
                return print(&json!(null));
            }
        },
        TraceCommand::Call {
            block,
            call,
            tracer_config,
        } => {
            let prepared = api.prepare_call(call, block, tracer_config).await?;
            (prepared.context, prepared.request)
        }
    };
    print(&json!({
        "snapshotHeight": context.snapshot_height,
        "request": request,
    }))
}

async fn trace<R: ReplayEngine>(api: &LedgerApi<'_, R>, command: TraceCommand) -> anyhow::Result<()> {
    match command {
        TraceCommand::Tx {
            hash,
            tracer_config,
        } => print(&api.trace_transaction(hash, tracer_config).await?),
        TraceCommand::Block {
            height,
            tracer_config,
        } => print(&api.trace_block(height, tracer_config).await?),
        TraceCommand::Call {
            block,
            call,
            tracer_config,
        } => print(&api.trace_call(call, block, tracer_config).await?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenvy_vars_if_present();
    let args = Cli::parse();
    trace_cli::tracing::init(trace_cli::tracing::level_for_verbosity(args.verbose));

    let fixture = Fixture::load(&args.ledger)?;

    let command = match args.command {
        Command::Check {
            envelope,
            height,
            time,
        } => {
            let report = check_envelope(&envelope, fixture.chain_id, fixture.forks, height, time)?;
            return print(&report);
        }
        Command::Trace(command) => command,
    };

    let ledger = fixture.ledger();
    if args.dry_run {
        let api = TraceApi::new(&ledger, &ledger, (), fixture.chain_id);
        return dry_run(&api, command).await;
    }

    let rpc_url = args
        .rpc_url
        .context("--rpc-url is required unless --dry-run is given")?;
    let provider = build_http_retry_provider(rpc_url, args.backoff_ms, args.max_retries);
    let engine = RpcReplayEngine::<_, RetryService<ReqwestTransport>>::new(provider);
    let api = TraceApi::new(&ledger, &ledger, engine, fixture.chain_id);
    trace(&api, command).await
}
