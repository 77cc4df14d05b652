//! Stablemint Core — Session Runner
//!
//! Initializes configuration, logging, and the ledger connection, then
//! keeps the price series fresh and logs every core event until
//! SIGINT. UI frontends embed the library crate directly; this binary
//! is the headless session used for operations and smoke testing.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Connect the alloy RPC provider (chain id validated)
//! 4. Establish the session account via ChainClient::connect
//! 5. Build the shared retry/rate policy and notification bus
//! 6. Build TransactionCoordinator + PriceFeedSynchronizer
//! 7. Spawn the event logger (bus subscriber)
//! 8. Spawn the price refresh loop
//! 9. Wait for SIGINT → graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::chain::{EvmChainClient, EvmProvider};
use domain::events::CoreEvent;
use ports::chain_client::ChainClient;
use usecases::notifications::NotificationBus;
use usecases::price_feed::PriceFeedSynchronizer;
use usecases::retry::RetryPolicy;
use usecases::TransactionCoordinator;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.session.log_level)
                }),
        )
        .json()
        .init();

    info!(
        session = %config.session.name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting stablemint core session"
    );

    // ── 3. Connect the RPC provider (validates chain id) ────
    let provider = Arc::new(
        EvmProvider::connect(&config.chain)
            .await
            .context("Failed to connect ledger RPC")?,
    );

    // ── 4. Establish the session account ────────────────────
    let chain = Arc::new(
        EvmChainClient::new(Arc::clone(&provider), config.chain.clone())
            .context("Failed to build chain client")?,
    );
    let account = chain
        .connect()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to establish session: {e}"))?;
    info!(address = %account.address, chain_id = account.chain_id, "Session account ready");

    // ── 5. Shared retry/rate policy and notification bus ────
    let retry = Arc::new(RetryPolicy::new(&config.retry, &config.rate_limits));
    let bus = NotificationBus::new(config.session.bus_capacity);

    // ── 6. Core components ──────────────────────────────────
    let coordinator = Arc::new(TransactionCoordinator::new(
        Arc::clone(&chain),
        Arc::clone(&retry),
        bus.clone(),
    ));
    let synchronizer = Arc::new(PriceFeedSynchronizer::new(
        Arc::clone(&chain),
        Arc::clone(&retry),
        bus.clone(),
        config.price_feed.clone(),
    ));

    // ── 7. Shutdown channel + event logger ──────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let logger_shutdown = shutdown_tx.subscribe();
    let logger_bus = bus.clone();
    let logger_handle = tokio::spawn(log_events(logger_bus, logger_shutdown));

    // ── 8. Price refresh loop ───────────────────────────────
    let refresh_shutdown = shutdown_tx.subscribe();
    let refresh_sync = Arc::clone(&synchronizer);
    let refresh_interval = Duration::from_secs(config.price_feed.refresh_interval_seconds);
    let refresh_handle = tokio::spawn(async move {
        run_price_loop(refresh_sync, refresh_interval, refresh_shutdown).await;
    });

    // ── 9. Run until SIGINT ─────────────────────────────────
    signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
    let _ = refresh_handle.await;
    let _ = logger_handle.await;

    // Submissions arrive through the embedding UI; summarize whatever
    // this session saw before exiting.
    let history = coordinator.history().await;
    info!(transactions = history.len(), "Session closed");

    Ok(())
}

/// Refresh the price series on a fixed cadence until shutdown.
async fn run_price_loop<C: ChainClient>(
    synchronizer: Arc<PriceFeedSynchronizer<C>>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = synchronizer.refresh().await {
                    warn!(reason = %e.reason(), kind = ?e.kind, "Price refresh failed");
                }
            }
            _ = shutdown.recv() => {
                info!("Price refresh loop stopping");
                return;
            }
        }
    }
}

/// Log every core event until shutdown.
async fn log_events(bus: NotificationBus, mut shutdown: broadcast::Receiver<()>) {
    let mut events = bus.subscribe();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(CoreEvent::Transaction { id, status, failure }) => {
                    match failure {
                        Some(failure) => {
                            warn!(%id, ?status, reason = %failure.reason(), "Transaction update");
                        }
                        None => info!(%id, ?status, "Transaction update"),
                    }
                }
                Ok(CoreEvent::Price { series }) => {
                    info!(
                        points = series.len(),
                        latest = ?series.latest().map(|p| p.value),
                        "Price series update"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Event logger lagged behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    error!("Notification bus closed unexpectedly");
                    return;
                }
            },
            _ = shutdown.recv() => {
                info!("Event logger stopping");
                return;
            }
        }
    }
}
