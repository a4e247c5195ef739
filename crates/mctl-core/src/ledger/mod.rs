//! Mission event ledger.
//!
//! This module provides an append-only envelope ledger backed by `SQLite`
//! with WAL mode for concurrent reads. Inserts are idempotent: each envelope
//! is grouped by its dedup key `(mission_id, event_type, proof_ref)`, replays
//! with an unchanged status are suppressed, and a key that has reached a
//! final-success status is frozen against further writes.
//!
//! # Features
//!
//! - **Append-only semantics**: rows can only be added, never modified or
//!   deleted
//! - **Idempotent insert**: safe under at-least-once delivery and webhook
//!   retries
//! - **Groupwise-maximum reads**: exactly one latest row per mission,
//!   deterministic under timestamp collisions
//! - **WAL mode**: concurrent read access while writes are in progress
//!
//! # Example
//!
//! ```rust,no_run
//! use mctl_core::envelope::EnvelopePayload;
//! use mctl_core::ledger::MissionLedger;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = MissionLedger::open("/path/to/missions.db")?;
//!
//! let envelope = EnvelopePayload::new("VAL-42", "PAYMENT_VERIFIED", "verified").validate()?;
//! let outcome = ledger.insert(&envelope)?;
//! assert!(outcome.inserted());
//!
//! // A replay of the same envelope is suppressed, not an error.
//! assert!(!ledger.insert(&envelope)?.inserted());
//! # Ok(())
//! # }
//! ```

mod storage;


pub use storage::{InsertOutcome, LedgerError, MissionLedger, StoredEnvelope, SummaryCounts};
