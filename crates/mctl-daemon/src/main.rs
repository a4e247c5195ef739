//! mctl-daemon - mission event ledger service.
//!
//! Binds the HTTP surface over the `SQLite`-backed ledger. Configuration
//! comes from a TOML file; CLI flags override file values.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mctl_core::config::{ForwarderConfig, ServiceConfig};
use mctl_core::emitter::EnvelopeEmitter;
use mctl_core::ledger::MissionLedger;
use mctl_daemon::{AppState, router};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// mctl daemon - mission event ledger service
#[derive(Parser, Debug)]
#[command(name = "mctl-daemon")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to service configuration file
    #[arg(short, long, default_value = "mctl.toml")]
    config: PathBuf,

    /// Path to the ledger database file (`SQLite`)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long)]
    bind: Option<String>,

    /// Downstream URL accepted envelopes are forwarded to
    #[arg(long)]
    forward_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log to file instead of stdout
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Daemon configuration derived from args and config file.
struct DaemonConfig {
    db_path: PathBuf,
    bind_addr: String,
    forwarder: Option<ForwarderConfig>,
}

impl DaemonConfig {
    fn new(args: &Args) -> Result<Self> {
        let config = if args.config.exists() {
            ServiceConfig::from_file(&args.config).context("failed to load configuration")?
        } else {
            ServiceConfig::default()
        };

        // CLI args override config file values.
        let db_path = args.db.clone().unwrap_or(config.ledger.db_path);
        let bind_addr = args.bind.clone().unwrap_or(config.server.bind_addr);
        let forwarder = match &args.forward_url {
            Some(url) => Some(ForwarderConfig {
                url: url.clone(),
                timeout_secs: config.forwarder.as_ref().map_or(10, |f| f.timeout_secs),
            }),
            None => config.forwarder,
        };

        Ok(Self {
            db_path,
            bind_addr,
            forwarder,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(log_file) = &args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .context("failed to open log file")?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file)
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let daemon_config = DaemonConfig::new(&args)?;

    let ledger = MissionLedger::open(&daemon_config.db_path).with_context(|| {
        format!(
            "failed to open ledger at {}",
            daemon_config.db_path.display()
        )
    })?;
    info!(db = %daemon_config.db_path.display(), "ledger opened");

    let emitter = EnvelopeEmitter::from_config(daemon_config.forwarder.as_ref())
        .context("failed to build downstream emitter")?;
    if emitter.is_configured() {
        info!("downstream forwarding enabled");
    }

    let app = router(AppState::new(ledger, emitter));

    let listener = tokio::net::TcpListener::bind(&daemon_config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", daemon_config.bind_addr))?;
    info!(addr = %daemon_config.bind_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let ctrl_c = tokio::signal::ctrl_c();

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = ctrl_c => {},
                _ = term.recv() => {},
            }
        },
        Err(error) => {
            warn!(%error, "failed to install SIGTERM handler");
            let _ = ctrl_c.await;
        },
    }

    info!("shutdown signal received");
}
