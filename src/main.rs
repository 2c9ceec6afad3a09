use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc, watch};

use stockstream::analytics::engine::AnalyticsEngine;
use stockstream::config::Config;
use stockstream::feed::synthetic::SyntheticFeed;
use stockstream::model::snapshot::AnalyticsSnapshot;
use stockstream::model::tick::Tick;
use stockstream::pipeline;
use stockstream::server::ws::{self, PushState};

const TICK_CHANNEL_CAPACITY: usize = 256;
const SNAPSHOT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // Load config
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    // Init tracing: JSON lines to stdout, RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                config
                    .logging
                    .level
                    .parse()
                    .unwrap_or_else(|_| "info".parse().unwrap())
            }),
        )
        .json()
        .init();

    tracing::info!(
        symbols = ?config.feed.symbol_universe(),
        window_secs = config.analytics.window_secs,
        bind = %config.server.bind,
        "Starting stockstream"
    );

    // Channels
    let (tick_tx, tick_rx) = mpsc::channel::<Tick>(TICK_CHANNEL_CAPACITY);
    let (snapshot_tx, _) = broadcast::channel::<Arc<AnalyticsSnapshot>>(SNAPSHOT_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let engine = Arc::new(AnalyticsEngine::new(config.analytics.window_secs));

    // Producer: synthetic feed -> tick channel
    let feed = SyntheticFeed::new(&config.feed);
    let feed_handle = tokio::spawn(feed.run(tick_tx, shutdown_rx.clone()));

    // Consumer: tick channel -> engine -> snapshot broadcast
    let pipeline_handle = tokio::spawn(pipeline::run(
        Arc::clone(&engine),
        tick_rx,
        snapshot_tx.clone(),
    ));

    // Push server
    let app = ws::router(PushState { snapshot_tx });
    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Push server listening");

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut server_shutdown = shutdown_rx.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.changed().await;
        })
        .await
        .context("push server failed")?;

    // Feed stops on the shutdown signal and drops its sender; the
    // pipeline then drains the channel and exits on its own.
    let _ = feed_handle.await;
    let _ = pipeline_handle.await;

    tracing::info!("stockstream stopped");
    Ok(())
}
