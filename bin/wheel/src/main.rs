//! Wheel - event indexer for the prize wheel contract.
//!
//! # Usage
//!
//! ```bash
//! # Ingest from the deployment block to the chain head, then serve
//! wheel
//!
//! # Start with environment overrides
//! DATABASE_URL=postgres://localhost/wheel RPC_URL=https://eth.llamarpc.com wheel
//!
//! # Serve what is already stored
//! wheel --skip-ingest
//! ```

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt};

use wheel_api::{ServerConfig, serve_with_shutdown};
use wheel_core::error::{IndexerError, IndexerResult};
use wheel_core::metrics::init_metrics;
use wheel_core::models::BlockRange;
use wheel_core::ports::{LogSource, RecordStore};
use wheel_core::services::{
    IngestConfig, IngestReport, IngestService, QueryConfig, QueryService,
};
use wheel_evm::{EvmClientConfig, EvmLogClient};
use wheel_storage::{Database, DatabaseConfig, PgRecordStore};

/// Wheel CLI - prize wheel event indexer.
#[derive(Parser, Debug)]
#[command(name = "wheel")]
#[command(about = "Wheel - RequestCreated/ResponseCreated event indexer")]
#[command(version)]
struct Cli {
    /// EVM node HTTP JSON-RPC URL.
    #[arg(long, env = "RPC_URL", default_value = "http://127.0.0.1:8545")]
    rpc_url: String,

    /// PostgreSQL database URL.
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://localhost/wheel")]
    database_url: String,

    /// Wheel contract address.
    #[arg(
        long,
        env = "CONTRACT_ADDRESS",
        default_value = "0x7E2E8B536017584ecC660deF55f235933049392d"
    )]
    contract_address: Address,

    /// First block to ingest (inclusive).
    #[arg(long, env = "FROM_BLOCK", default_value = "20977112")]
    from_block: u64,

    /// Last block to ingest (inclusive). Defaults to the chain head.
    #[arg(long, env = "TO_BLOCK")]
    to_block: Option<u64>,

    /// Blocks per `eth_getLogs` call. 0 fetches the whole range at once.
    #[arg(long, env = "CHUNK_SIZE", default_value = "10000")]
    chunk_size: u64,

    /// HTTP server port (REST + GraphQL).
    #[arg(long, env = "HTTP_PORT", default_value = "8080")]
    http_port: u16,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Timeout for each RPC or database call, in seconds.
    #[arg(long, env = "CALL_TIMEOUT_SECS", default_value = "30")]
    call_timeout_secs: u64,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Run database migrations and exit.
    #[arg(long)]
    migrate_only: bool,

    /// Serve stored records without ingesting.
    #[arg(long)]
    skip_ingest: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled = match format!("0.0.0.0:{}", cli.metrics_port).parse::<std::net::SocketAddr>() {
        Ok(metrics_addr) => {
            match PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                Ok(()) => {
                    init_metrics();
                    true
                }
                Err(e) => {
                    warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e);
                    false
                }
            }
        }
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Wheel Indexer");
    debug!(rpc_url = %mask_password(&cli.rpc_url), "RPC endpoint");
    debug!(database_url = %mask_password(&cli.database_url), "Database endpoint");
    debug!(contract = %cli.contract_address, "Contract");

    // ─────────────────────────────────────────────────────────────────────────
    // 🗄️ DATABASE
    // ─────────────────────────────────────────────────────────────────────────
    let indexer_db_config = DatabaseConfig::for_indexer(&cli.database_url);
    let api_db_config = DatabaseConfig::for_api(&cli.database_url);

    info!("🗄️  Connecting to database...");
    let db = Database::connect(&indexer_db_config)
        .await
        .context("Failed to connect to database")?;

    db.migrate().await.context("Failed to run migrations")?;
    info!("🗄️  Database ready (migrations applied)");

    if cli.migrate_only {
        info!("🛑 --migrate-only flag set, exiting");
        return Ok(());
    }

    let api_db = Database::connect(&api_db_config)
        .await
        .context("Failed to create API database pool")?;

    let api_store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(api_db.pool().clone()));
    let query = QueryService::new(
        QueryConfig {
            call_timeout: Duration::from_secs(cli.call_timeout_secs),
        },
        api_store,
    );

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ SERVICES START
    // ─────────────────────────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server_shutdown_rx = shutdown_tx.subscribe();

    let ingest_handle = if cli.skip_ingest {
        info!("⏭️  --skip-ingest flag set, serving stored records only");
        None
    } else {
        // ─────────────────────────────────────────────────────────────────────
        // 📡 CHAIN CONNECTION
        // ─────────────────────────────────────────────────────────────────────
        info!("📡 Connecting to EVM node...");
        let client = EvmLogClient::connect(&EvmClientConfig {
            rpc_url: cli.rpc_url.clone(),
        })
        .await
        .context("Failed to connect to EVM node")?;

        let ingest = IngestService::new(
            IngestConfig {
                contract: cli.contract_address,
                call_timeout: Duration::from_secs(cli.call_timeout_secs),
            },
            Arc::new(client),
            Arc::new(PgRecordStore::new(db.pool().clone())),
        );

        let (from_block, to_block, chunk_size) = (cli.from_block, cli.to_block, cli.chunk_size);
        Some(tokio::spawn(
            async move {
                match run_ingestion(&ingest, from_block, to_block, chunk_size, shutdown_rx).await {
                    Ok(report) => info!(
                        inserted = report.inserted,
                        duplicates = report.duplicates,
                        malformed = report.malformed,
                        "✅ Ingestion complete"
                    ),
                    Err(IndexerError::ShutdownRequested) => debug!("Ingestion interrupted"),
                    Err(e) => error!(error = %e, "❌ Ingestion failed, serving stored records"),
                }
            }
            .instrument(info_span!("ingest")),
        ))
    };

    let server_config = ServerConfig {
        host: "0.0.0.0".to_string(),
        port: cli.http_port,
        enable_playground: true,
    };

    let http_port = cli.http_port;
    let server_handle = tokio::spawn(
        async move {
            let shutdown_signal = async move {
                while !*server_shutdown_rx.borrow() {
                    if server_shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            };

            if let Err(e) = serve_with_shutdown(query, server_config, shutdown_signal).await {
                error!(error = %e, "❌ Server error");
            }
            debug!("Server stopped");
        }
        .instrument(info_span!("http")),
    );

    // ─────────────────────────────────────────────────────────────────────────
    // ✅ READY
    // ─────────────────────────────────────────────────────────────────────────
    info!("✅ Wheel ready");
    info!("   🌐 REST:     http://localhost:{}/events", http_port);
    info!("   ⚡ GraphQL:  http://localhost:{}/graphql", http_port);
    if metrics_enabled {
        info!(
            "   📊 Metrics:  http://localhost:{}/metrics",
            cli.metrics_port
        );
    } else {
        info!("   📊 Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    shutdown_signal().await;

    // ─────────────────────────────────────────────────────────────────────────
    // 🛑 SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    info!("🛑 Shutting down...");
    let _ = shutdown_tx.send(true);

    if let Some(handle) = ingest_handle {
        match tokio::time::timeout(Duration::from_secs(30), handle).await {
            Ok(_) => debug!("Ingestion stopped"),
            Err(_) => warn!("⚠️  Ingestion shutdown timed out"),
        }
    }

    match tokio::time::timeout(Duration::from_secs(10), server_handle).await {
        Ok(_) => debug!("Server stopped"),
        Err(_) => warn!("⚠️  Server shutdown timed out"),
    }

    db.close().await;
    api_db.close().await;

    info!("🛑 Shutdown complete");
    Ok(())
}

/// Ingest `from_block..=to_block` in windows of `chunk_size` blocks.
///
/// The upper bound defaults to the source's latest block.
async fn run_ingestion<S, R>(
    ingest: &IngestService<S, R>,
    from_block: u64,
    to_block: Option<u64>,
    chunk_size: u64,
    mut shutdown_rx: watch::Receiver<bool>,
) -> IndexerResult<IngestReport>
where
    S: LogSource + ?Sized,
    R: RecordStore + ?Sized,
{
    let to_block = match to_block {
        Some(block) => block,
        None => ingest.latest_block(&mut shutdown_rx).await?,
    };
    let range = BlockRange::new(from_block, to_block)?;
    let windows = range.chunks(chunk_size);
    info!(range = %range, windows = windows.len(), "📥 Ingesting");

    let mut total = IngestReport::default();
    for window in windows {
        let report = ingest.ingest(window, &mut shutdown_rx).await?;
        total.merge(report);
    }
    Ok(total)
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in a connection URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "❌ Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "❌ Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
