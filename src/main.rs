use anyhow::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

use edge_trust::{
    api::{build_app, LedgerApiState, RequestLogConfig},
    config::TrustConfig,
    database::{EntityStore, MemoryStore},
    protocol::{IntervalClock, StaticAdminSet},
    ReputationManager, TrustEngine,
};

/// Sequence slot holding the last block height across restarts
const BLOCK_HEIGHT_SEQUENCE: &str = "block";

#[tokio::main]
async fn main() -> Result<()> {
    let config = TrustConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        eprintln!("Please check the TRUST_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting edge trust engine");

    let store = match &config.chain.state_path {
        Some(path) => MemoryStore::load(path)?,
        None => MemoryStore::new(),
    };
    let height = store.sequence(BLOCK_HEIGHT_SEQUENCE);
    let clock = IntervalClock::new(config.chain.genesis_time, config.chain.block_interval_secs)
        .at_height(height);

    let admins = StaticAdminSet::new(config.governance.admins.iter().cloned());
    let reputation = ReputationManager::new(config.governance.to_thresholds());
    info!(
        "Governance initialized: {} admin(s), proposal_threshold={}, resuming at height {}",
        admins.len(),
        config.governance.proposal_threshold,
        height
    );

    let state = LedgerApiState::new(TrustEngine::new(store, clock, admins, reputation));
    let app = build_app(
        state.clone(),
        RequestLogConfig {
            log_requests: config.logging.log_requests,
        },
    );

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Trust engine listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(path) = &config.chain.state_path {
        let engine = state.engine.read().await;
        let mut store = engine.store().clone();
        store.set_sequence(BLOCK_HEIGHT_SEQUENCE, engine.clock().height());
        store.save(path)?;
    }

    info!("Trust engine stopped");
    Ok(())
}

/// Initialize logging at the configured level
fn init_logging(config: &TrustConfig) -> Result<()> {
    let log_level = match config.logging.level.as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_requests {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

/// Resolve once `signal` fires; never resolves if the handler failed to install
async fn wait_for_signal<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
