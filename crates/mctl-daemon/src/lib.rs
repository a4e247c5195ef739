//! mctl-daemon library.
//!
//! The daemon exposes the mission event ledger over HTTP: envelope
//! ingestion, aggregate read models, runbook lookup, the mission-run
//! trigger, and a server-rendered dashboard. Handlers are thin: validation
//! happens in `mctl-core::envelope`, all state lives in the ledger.
//!
//! The binary (`main.rs`) wires configuration and serves
//! [`handlers::router`]; integration tests drive the same router directly.

pub mod dashboard;
pub mod error;
pub mod handlers;
pub mod state;

pub use handlers::router;
pub use state::AppState;
