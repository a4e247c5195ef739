//! `SQLite`-backed mission ledger storage.
//!
//! The [`MissionLedger`] owns a single connection behind a mutex; every
//! operation round-trips to the backing store as one short-lived statement
//! or transaction. The insert decision (dedup lookup, finality check,
//! append) runs inside a `BEGIN IMMEDIATE` transaction, so two inserts
//! racing on the same dedup key serialize on `SQLite`'s write lock and can
//! never both observe "no existing row".

// Row counts fit i64 and timestamps won't overflow i64 nanoseconds until
// 2262. Mutex poisoning indicates a panic in another thread, which is
// unrecoverable.
#![allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::missing_panics_doc
)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{
    Connection, OpenFlags, OptionalExtension, TransactionBehavior, params, params_from_iter,
};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::envelope::Envelope;
use crate::scoring::{self, ScoredEnvelope, TieredEnvelope};
use crate::status::{FINAL_SUCCESS_STATUSES, is_final_status};

/// Schema SQL embedded at compile time.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Columns selected for every read of stored envelopes.
const ENVELOPE_COLUMNS: &str = "id, ts, mission_id, event_type, status, proof_ref, meta";

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// Database error from `SQLite`.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error during database operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope metadata could not be serialized for storage.
    #[error("meta serialization failed: {0}")]
    Meta(#[from] serde_json::Error),
}

/// Outcome of an idempotent insert.
///
/// Suppression is a normal, observable outcome distinguishing "accepted as
/// duplicate/stale" from "accepted as new fact" — callers must not treat a
/// non-appended outcome as failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was appended.
    Appended {
        /// Row id assigned by the ledger.
        seq_id: i64,
        /// Server-assigned insertion timestamp (nanoseconds since epoch).
        ts: i64,
    },

    /// The dedup key already holds a row with the same status.
    Duplicate,

    /// The dedup key has reached a final-success status; finality wins over
    /// any later non-matching status.
    Frozen,
}

impl InsertOutcome {
    /// Returns `true` when a new row was appended.
    #[must_use]
    pub const fn inserted(&self) -> bool {
        matches!(self, Self::Appended { .. })
    }
}

/// A stored envelope row, as returned by the read models.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEnvelope {
    /// Row id (monotonically increasing insertion order).
    pub seq_id: i64,

    /// Server-assigned insertion timestamp, nanoseconds since the Unix
    /// epoch. Non-decreasing across rows; ties broken by `seq_id`.
    pub ts: i64,

    /// Mission identifier.
    pub mission_id: String,

    /// Event type.
    pub event_type: String,

    /// Normalized status.
    pub status: String,

    /// Proof reference; empty string when absent.
    pub proof_ref: String,

    /// Producer-defined metadata, opaque to the ledger.
    pub meta: Map<String, Value>,
}

impl StoredEnvelope {
    /// Builds the stored view of an envelope that was just appended.
    #[must_use]
    pub fn from_accepted(envelope: &Envelope, seq_id: i64, ts: i64) -> Self {
        Self {
            seq_id,
            ts,
            mission_id: envelope.mission_id.clone(),
            event_type: envelope.event_type.clone(),
            status: envelope.status.clone(),
            proof_ref: envelope.proof_ref.clone(),
            meta: envelope.meta.clone(),
        }
    }
}

/// Aggregate counts across all stored rows (not deduplicated by mission).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    /// Total row count.
    pub total: u64,

    /// Rows whose status is in the final-success set.
    pub ok: u64,

    /// `total - ok`.
    pub fail: u64,
}

/// The append-only mission event ledger backed by `SQLite`.
///
/// WAL mode allows concurrent reads while writes are in progress. Rows are
/// immutable once stored; the ledger's only state transition is append.
pub struct MissionLedger {
    conn: Arc<Mutex<Connection>>,
}

impl MissionLedger {
    /// Opens or creates a ledger at the specified path.
    ///
    /// If the database doesn't exist, it is created with the schema. WAL
    /// mode is enabled for concurrent reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Self::initialize_connection(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory ledger for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_connection(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Initialize the connection with schema and pragmas.
    fn initialize_connection(conn: &Connection) -> Result<(), LedgerError> {
        // Execute schema (includes PRAGMA statements)
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Inserts an envelope idempotently.
    ///
    /// The dedup lookup, finality check, and append run in one
    /// `BEGIN IMMEDIATE` transaction: concurrent inserts on the same dedup
    /// key serialize on the write lock, so at most one of them can pass the
    /// "no existing row" branch.
    ///
    /// Decision, per the most recent row sharing
    /// `(mission_id, event_type, proof_ref)`:
    ///
    /// - no such row: append
    /// - same status: [`InsertOutcome::Duplicate`], no append
    /// - final-success status: [`InsertOutcome::Frozen`], no append
    /// - different non-final status: append (legitimate progression)
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; nothing is stored in that
    /// case and the caller may retry safely.
    pub fn insert(&self, envelope: &Envelope) -> Result<InsertOutcome, LedgerError> {
        let meta = serde_json::to_string(&envelope.meta)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT status FROM envelopes
                 WHERE mission_id = ?1 AND event_type = ?2 AND proof_ref = ?3
                 ORDER BY ts DESC, id DESC
                 LIMIT 1",
                params![envelope.mission_id, envelope.event_type, envelope.proof_ref],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(existing) = existing {
            if existing == envelope.status {
                debug!(
                    mission_id = %envelope.mission_id,
                    event_type = %envelope.event_type,
                    proof_ref = %envelope.proof_ref,
                    status = %envelope.status,
                    "duplicate envelope suppressed"
                );
                return Ok(InsertOutcome::Duplicate);
            }
            if is_final_status(&existing) {
                debug!(
                    mission_id = %envelope.mission_id,
                    event_type = %envelope.event_type,
                    proof_ref = %envelope.proof_ref,
                    existing = %existing,
                    incoming = %envelope.status,
                    "dedup key already final, envelope suppressed"
                );
                return Ok(InsertOutcome::Frozen);
            }
        }

        // Clamp to the current maximum so timestamps never regress, even if
        // the wall clock does.
        let max_ts: Option<i64> = tx.query_row("SELECT MAX(ts) FROM envelopes", [], |row| {
            row.get(0)
        })?;
        let ts = now_ns().max(max_ts.unwrap_or(0));

        tx.execute(
            "INSERT INTO envelopes (ts, mission_id, event_type, status, proof_ref, meta)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                ts,
                envelope.mission_id,
                envelope.event_type,
                envelope.status,
                envelope.proof_ref,
                meta,
            ],
        )?;
        let seq_id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            seq_id,
            mission_id = %envelope.mission_id,
            event_type = %envelope.event_type,
            status = %envelope.status,
            "envelope appended"
        );

        Ok(InsertOutcome::Appended { seq_id, ts })
    }

    /// Counts across all stored rows.
    ///
    /// `ok` counts rows whose status is in [`FINAL_SUCCESS_STATUSES`];
    /// `fail` is everything else. Purely derived, no side effects.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn summary_counts(&self) -> Result<SummaryCounts, LedgerError> {
        let conn = self.conn.lock().unwrap();

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM envelopes", [], |row| row.get(0))?;

        let placeholders = vec!["?"; FINAL_SUCCESS_STATUSES.len()].join(", ");
        let ok: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM envelopes WHERE status IN ({placeholders})"),
            params_from_iter(FINAL_SUCCESS_STATUSES),
            |row| row.get(0),
        )?;

        Ok(SummaryCounts {
            total: total as u64,
            ok: ok as u64,
            fail: (total - ok) as u64,
        })
    }

    /// Returns the latest row per distinct mission, ordered by timestamp
    /// descending.
    ///
    /// For each mission the row with maximum `ts` wins; timestamp collisions
    /// are broken by the highest row id, so the result is deterministic and
    /// contains exactly one row per mission. `limit` is clamped to a minimum
    /// of 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn latest_per_mission(&self, limit: u64) -> Result<Vec<StoredEnvelope>, LedgerError> {
        let limit = limit.max(1);
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(&format!(
            "SELECT {ENVELOPE_COLUMNS} FROM (
                 SELECT {ENVELOPE_COLUMNS},
                        ROW_NUMBER() OVER (
                            PARTITION BY mission_id
                            ORDER BY ts DESC, id DESC
                        ) AS row_rank
                 FROM envelopes
             )
             WHERE row_rank = 1
             ORDER BY ts DESC, id DESC
             LIMIT ?1"
        ))?;

        let rows = stmt
            .query_map(params![limit as i64], row_to_envelope)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Latest-per-mission rows decorated with their evidence tier.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying query fails.
    pub fn proof_matrix(&self, limit: u64) -> Result<Vec<TieredEnvelope>, LedgerError> {
        Ok(scoring::proof_matrix(self.latest_per_mission(limit)?))
    }

    /// Latest-per-mission rows decorated with tier and settlement score.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying query fails.
    pub fn settlement_score(&self, limit: u64) -> Result<Vec<ScoredEnvelope>, LedgerError> {
        Ok(scoring::settlement_score(self.latest_per_mission(limit)?))
    }
}

/// Maps one `envelopes` row to a [`StoredEnvelope`].
fn row_to_envelope(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredEnvelope> {
    let meta_json: String = row.get(6)?;
    let meta = serde_json::from_str(&meta_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(StoredEnvelope {
        seq_id: row.get(0)?,
        ts: row.get(1)?,
        mission_id: row.get(2)?,
        event_type: row.get(3)?,
        status: row.get(4)?,
        proof_ref: row.get(5)?,
        meta,
    })
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}
