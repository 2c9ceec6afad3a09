use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::analytics::engine::AnalyticsEngine;
use crate::model::snapshot::AnalyticsSnapshot;
use crate::model::tick::Tick;

/// Drain the tick channel through the analytics engine, fanning each
/// snapshot out to push subscribers.
///
/// The channel is the at-least-once transport seam. Every received tick
/// is either processed into a snapshot or logged as a failure and
/// dropped (the nack analogue); nothing is skipped silently.
pub async fn run(
    engine: Arc<AnalyticsEngine>,
    mut tick_rx: mpsc::Receiver<Tick>,
    snapshot_tx: broadcast::Sender<Arc<AnalyticsSnapshot>>,
) {
    while let Some(tick) = tick_rx.recv().await {
        let symbol = tick.symbol.clone();
        match engine.ingest(tick) {
            Ok(snapshot) => {
                tracing::debug!(
                    symbol = %snapshot.symbol,
                    window_len = snapshot.ticks.len(),
                    avg_price = snapshot.analytics.avg_price,
                    "Processed tick"
                );
                // Err only means nobody is subscribed right now.
                let _ = snapshot_tx.send(Arc::new(snapshot));
            }
            Err(e) => {
                tracing::error!(symbol = %symbol, error = %e, "Failed to process tick");
            }
        }
    }
    tracing::info!("Tick channel closed, pipeline stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::engine::DEFAULT_WINDOW_SECS;

    #[test]
    fn processes_ticks_and_broadcasts_snapshots() {
        tokio_test::block_on(async {
            let engine = Arc::new(AnalyticsEngine::new(DEFAULT_WINDOW_SECS));
            let (tick_tx, tick_rx) = mpsc::channel(8);
            let (snapshot_tx, mut snapshot_rx) = broadcast::channel(8);

            tick_tx.send(Tick::new("AAPL", 187.5, 900)).await.unwrap();
            tick_tx.send(Tick::new("AAPL", 188.0, 100)).await.unwrap();
            drop(tick_tx);

            run(engine, tick_rx, snapshot_tx).await;

            let first = snapshot_rx.recv().await.unwrap();
            assert_eq!(first.symbol, "AAPL");
            assert_eq!(first.ticks.len(), 1);

            let second = snapshot_rx.recv().await.unwrap();
            assert_eq!(second.ticks.len(), 2);
            assert!((second.analytics.avg_price - 187.75).abs() < 1e-12);
        });
    }
}
