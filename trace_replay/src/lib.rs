//! Historical trace replay.
//!
//! To trace a committed transaction, a replay engine needs more than the
//! transaction itself: every Ethereum message that ran before it in the same
//! block, in commit order, and the block it ran in. This crate rebuilds that
//! context from the ledger.
//!
//! A trace by hash goes through these steps:
//!
//! 1. [`locator`] maps the hash to a block and a position, and checks the
//!    position against the block content.
//! 2. [`predecessors`] decodes the block up to the target and collects the
//!    Ethereum messages before it, skipping envelopes that do not decode.
//! 3. [`context`] picks the snapshot height and fetches consensus limits.
//! 4. [`request`] assembles the [`TraceRequest`] sent to the [`ReplayEngine`].
//! 5. [`response`] decodes what the engine sends back.
//!
//! [`TraceApi`] ties the steps together, and also exposes block traces and
//! speculative call traces.

mod api;
pub mod backend;
pub mod context;
mod error;
pub mod locator;
pub mod memory;
pub mod predecessors;
pub mod request;
pub mod response;

pub use api::{PreparedBlockTrace, PreparedTrace, TraceApi};
pub use backend::{ConsensusParamsSource, LedgerStore, ReplayEngine};
pub use context::{snapshot_height, BlockContext, ReplayContext};
pub use error::{ErrorKind, TraceError, Upstream};
pub use memory::InMemoryLedger;
pub use request::{TraceRequest, TraceTargets};
pub use response::{BlockLayout, TxTraceResult};
