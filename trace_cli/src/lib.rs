//! Building blocks of the `evm-trace` command line tool: a JSON-RPC replay
//! engine, a file-backed ledger, and an offline run of the ante chain.

pub mod check;
pub mod env;
pub mod fixture;
pub mod rpc;
pub mod tracing;
