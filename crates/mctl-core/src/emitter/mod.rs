//! Downstream envelope forwarding.
//!
//! When a forwarder is configured, every *accepted* (appended) envelope is
//! POSTed as JSON to the downstream endpoint. Delivery is at-least-once:
//! the ledger is the source of truth, the downstream consumer dedups by the
//! same key discipline, and a transport failure never un-stores the row.
//! When no forwarder is configured the emitter is silently disabled.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::config::ForwarderConfig;
use crate::ledger::StoredEnvelope;

/// Errors that can occur while forwarding an envelope.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The downstream request could not be built or sent.
    #[error("downstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The downstream endpoint rejected the envelope.
    #[error("downstream returned {status}")]
    Status {
        /// HTTP status code returned by the downstream endpoint.
        status: u16,
    },
}

/// Result of attempting to forward an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// The envelope was accepted downstream.
    Forwarded,

    /// No forwarder is configured; nothing was sent.
    Disabled,
}

/// Forwards accepted envelopes to a configured downstream endpoint.
pub struct EnvelopeEmitter {
    client: reqwest::Client,
    target: Option<String>,
}

impl EnvelopeEmitter {
    /// Creates an emitter from optional forwarder configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: Option<&ForwarderConfig>) -> Result<Self, EmitError> {
        let Some(config) = config else {
            return Ok(Self::disabled());
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            target: Some(config.url.clone()),
        })
    }

    /// Creates a disabled emitter that never sends anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            target: None,
        }
    }

    /// Returns `true` when a downstream endpoint is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    /// Forwards one accepted envelope downstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the downstream endpoint
    /// responds with a non-success status. Callers decide whether that is
    /// fatal; the ledger row is already durable either way.
    pub async fn forward(&self, envelope: &StoredEnvelope) -> Result<EmitOutcome, EmitError> {
        let Some(target) = &self.target else {
            debug!("forwarder not configured, skipping emission");
            return Ok(EmitOutcome::Disabled);
        };

        let response = self.client.post(target).json(envelope).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EmitError::Status {
                status: status.as_u16(),
            });
        }

        debug!(
            target = %target,
            mission_id = %envelope.mission_id,
            event_type = %envelope.event_type,
            "envelope forwarded downstream"
        );
        Ok(EmitOutcome::Forwarded)
    }
}
