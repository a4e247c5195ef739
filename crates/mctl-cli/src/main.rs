//! mctl - mission event ledger operator CLI.
//!
//! Operates directly on the ledger database for scripting and diagnostics;
//! the daemon owns the HTTP surface.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mctl_core::ledger::MissionLedger;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

/// mctl - mission event ledger operator tool
#[derive(Parser, Debug)]
#[command(name = "mctl")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the ledger database file (`SQLite`)
    #[arg(long, default_value = "missions.db")]
    db: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print summary counts across all stored rows
    Summary,

    /// Print the latest row per mission
    Latest {
        /// Maximum number of missions to return
        #[arg(long, default_value_t = 50)]
        limit: u64,
    },

    /// Print latest-per-mission rows with evidence tiers
    Matrix {
        /// Maximum number of missions to return
        #[arg(long, default_value_t = 50)]
        limit: u64,
    },

    /// Print latest-per-mission rows with tiers and settlement scores
    Score {
        /// Maximum number of missions to return
        #[arg(long, default_value_t = 50)]
        limit: u64,
    },

    /// Print the remediation runbook for a reason code
    Runbook {
        /// Reason code to look up
        reason_code: String,
    },

    /// Validate and insert one envelope
    Ingest {
        /// Mission identifier (VAL-<digits>)
        #[arg(long)]
        mission_id: String,

        /// Event type (e.g. PAYMENT_VERIFIED)
        #[arg(long)]
        event_type: String,

        /// Reported status (normalized to uppercase)
        #[arg(long)]
        status: String,

        /// Optional proof reference
        #[arg(long)]
        proof_ref: Option<String>,

        /// Optional metadata as a JSON object
        #[arg(long)]
        meta: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ledger = MissionLedger::open(&cli.db)
        .with_context(|| format!("failed to open ledger at {}", cli.db.display()))?;

    match cli.command {
        Commands::Summary => commands::query::summary(&ledger),
        Commands::Latest { limit } => commands::query::latest(&ledger, limit),
        Commands::Matrix { limit } => commands::query::matrix(&ledger, limit),
        Commands::Score { limit } => commands::query::score(&ledger, limit),
        Commands::Runbook { reason_code } => commands::query::runbook(&reason_code),
        Commands::Ingest {
            mission_id,
            event_type,
            status,
            proof_ref,
            meta,
        } => commands::ingest::run(&ledger, mission_id, event_type, status, proof_ref, meta),
    }
}
