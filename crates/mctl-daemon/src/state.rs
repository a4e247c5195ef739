//! Shared daemon state.

use std::sync::Arc;
use std::time::Instant;

use mctl_core::emitter::EnvelopeEmitter;
use mctl_core::ledger::MissionLedger;

/// State shared by all request handlers.
///
/// The ledger is the sole owner of persisted state; handlers hold no
/// mutable in-process cache of ledger contents.
#[derive(Clone)]
pub struct AppState {
    /// The mission event ledger.
    pub ledger: Arc<MissionLedger>,

    /// Downstream forwarder for accepted envelopes.
    pub emitter: Arc<EnvelopeEmitter>,

    /// Daemon start time, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Creates shared state over a ledger and emitter.
    #[must_use]
    pub fn new(ledger: MissionLedger, emitter: EnvelopeEmitter) -> Self {
        Self {
            ledger: Arc::new(ledger),
            emitter: Arc::new(emitter),
            started_at: Instant::now(),
        }
    }

    /// Seconds since the daemon started.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
