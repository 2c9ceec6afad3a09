use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};

use crate::config::FeedConfig;
use crate::model::tick::Tick;

/// Synthetic market feed: emits uniform-random ticks for a fixed symbol
/// universe at a fixed cadence. Stands in for a real exchange feed on
/// the producing side of the tick channel.
pub struct SyntheticFeed {
    symbols: Vec<String>,
    interval: Duration,
    price_min_cents: i64,
    price_max_cents: i64,
    volume_min: u64,
    volume_max: u64,
    rng: StdRng,
}

impl SyntheticFeed {
    pub fn new(config: &FeedConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Seedable constructor so tests get a deterministic tick stream.
    pub fn with_rng(config: &FeedConfig, rng: StdRng) -> Self {
        let symbols = config.symbol_universe();
        assert!(!symbols.is_empty(), "feed symbol universe must not be empty");
        Self {
            symbols,
            interval: Duration::from_millis(config.interval_ms),
            price_min_cents: (config.price_min * 100.0).round() as i64,
            price_max_cents: (config.price_max * 100.0).round() as i64,
            volume_min: config.volume_min,
            volume_max: config.volume_max,
            rng,
        }
    }

    /// Draw one tick stamped with the current wall clock. Prices are
    /// cent-quoted, so two decimal places like an equity tape.
    pub fn next_tick(&mut self) -> Tick {
        let symbol = self.symbols[self.rng.gen_range(0..self.symbols.len())].clone();
        let cents = self.rng.gen_range(self.price_min_cents..=self.price_max_cents);
        let volume = self.rng.gen_range(self.volume_min..=self.volume_max);
        Tick::at(symbol, cents as f64 / 100.0, volume, Utc::now())
    }

    /// Emit ticks on `tick_tx` until shutdown flips or the channel
    /// closes. A full channel drops the tick on the producing side; the
    /// processing loop itself never sheds load.
    pub async fn run(
        mut self,
        tick_tx: mpsc::Sender<Tick>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut interval = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let tick = self.next_tick();
                    match tick_tx.try_send(tick) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(tick)) => {
                            tracing::warn!(symbol = %tick.symbol, "Tick channel full, dropping tick");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            tracing::info!("Tick channel closed, stopping synthetic feed");
                            return Ok(());
                        }
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("Shutdown requested, stopping synthetic feed");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FeedConfig {
        FeedConfig {
            symbols: vec!["AAPL".to_string(), "msft".to_string()],
            interval_ms: 10,
            price_min: 100.0,
            price_max: 200.0,
            volume_min: 1000,
            volume_max: 10000,
        }
    }

    #[test]
    fn ticks_stay_within_configured_bands() {
        let mut feed = SyntheticFeed::with_rng(&config(), StdRng::seed_from_u64(7));
        for _ in 0..500 {
            let tick = feed.next_tick();
            assert!(tick.symbol == "AAPL" || tick.symbol == "MSFT");
            assert!(tick.price >= 100.0 && tick.price <= 200.0);
            assert!(tick.volume >= 1000 && tick.volume <= 10000);
            // Cent-quoted: scaling to cents is integral.
            let cents = tick.price * 100.0;
            assert!((cents - cents.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn seeded_feed_is_deterministic() {
        let mut a = SyntheticFeed::with_rng(&config(), StdRng::seed_from_u64(42));
        let mut b = SyntheticFeed::with_rng(&config(), StdRng::seed_from_u64(42));
        for _ in 0..50 {
            let ta = a.next_tick();
            let tb = b.next_tick();
            assert_eq!(ta.symbol, tb.symbol);
            assert!((ta.price - tb.price).abs() < f64::EPSILON);
            assert_eq!(ta.volume, tb.volume);
        }
    }

    #[test]
    #[should_panic(expected = "feed symbol universe must not be empty")]
    fn empty_universe_panics() {
        let mut cfg = config();
        cfg.symbols = vec!["  ".to_string()];
        let _ = SyntheticFeed::with_rng(&cfg, StdRng::seed_from_u64(1));
    }
}
