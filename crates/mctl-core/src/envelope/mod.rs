//! Envelope validation and normalization.
//!
//! An [`EnvelopePayload`] is the wire form of one reported fact about a
//! mission's progress. [`EnvelopePayload::validate`] is the only way to
//! produce an [`Envelope`], so every envelope the ledger sees has already
//! been normalized: the status is uppercased, a missing `proof_ref` becomes
//! the empty string (absence and `""` share a dedup key), and a missing
//! `meta` becomes an empty object.
//!
//! Validation rejects before any state is touched; a rejected payload is
//! never partially stored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Required prefix for mission identifiers.
pub const MISSION_ID_PREFIX: &str = "VAL-";

/// Errors produced while validating an envelope payload.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// The mission identifier does not match `VAL-<digits>`.
    #[error("mission_id must match VAL-<digits>, got {0:?}")]
    MissionIdFormat(String),

    /// The event type is empty after trimming.
    #[error("event_type must be non-empty")]
    EmptyEventType,

    /// The status is empty after trimming.
    #[error("status must be non-empty")]
    EmptyStatus,
}

/// Wire form of an event envelope, as posted by emitters.
///
/// Unknown extra fields are rejected at deserialization time.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvelopePayload {
    /// Mission identifier, `VAL-<digits>`.
    pub mission_id: String,

    /// Event type, open vocabulary (e.g. `PAYMENT_VERIFIED`).
    pub event_type: String,

    /// Reported status; case-normalized during validation.
    pub status: String,

    /// Optional reference to supporting evidence.
    #[serde(default)]
    pub proof_ref: Option<String>,

    /// Open key/value metadata, opaque to the ledger.
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}

impl EnvelopePayload {
    /// Creates a payload with the required fields set.
    #[must_use]
    pub fn new(
        mission_id: impl Into<String>,
        event_type: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            mission_id: mission_id.into(),
            event_type: event_type.into(),
            status: status.into(),
            proof_ref: None,
            meta: None,
        }
    }

    /// Sets the proof reference (builder pattern).
    #[must_use]
    pub fn with_proof_ref(mut self, proof_ref: impl Into<String>) -> Self {
        self.proof_ref = Some(proof_ref.into());
        self
    }

    /// Sets the metadata object (builder pattern).
    #[must_use]
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Validates and normalizes the payload into an [`Envelope`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the mission identifier is malformed
    /// or a required field is empty.
    pub fn validate(self) -> Result<Envelope, ValidationError> {
        let mission_id = self.mission_id.trim().to_string();
        if !is_valid_mission_id(&mission_id) {
            return Err(ValidationError::MissionIdFormat(mission_id));
        }

        let event_type = self.event_type.trim().to_string();
        if event_type.is_empty() {
            return Err(ValidationError::EmptyEventType);
        }

        let status = self.status.trim().to_ascii_uppercase();
        if status.is_empty() {
            return Err(ValidationError::EmptyStatus);
        }

        Ok(Envelope {
            mission_id,
            event_type,
            status,
            proof_ref: self.proof_ref.unwrap_or_default(),
            meta: self.meta.unwrap_or_default(),
        })
    }
}

/// A validated, normalized envelope ready for the ledger.
///
/// Only constructed through [`EnvelopePayload::validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Mission identifier, `VAL-<digits>`.
    pub mission_id: String,

    /// Event type, trimmed and non-empty.
    pub event_type: String,

    /// Uppercased status.
    pub status: String,

    /// Proof reference; empty string when absent.
    pub proof_ref: String,

    /// Metadata object; empty when absent.
    pub meta: Map<String, Value>,
}

fn is_valid_mission_id(mission_id: &str) -> bool {
    mission_id
        .strip_prefix(MISSION_ID_PREFIX)
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
