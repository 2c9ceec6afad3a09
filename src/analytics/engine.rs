use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::analytics::calculator;
use crate::analytics::window::SymbolWindow;
use crate::error::AppError;
use crate::model::snapshot::AnalyticsSnapshot;
use crate::model::tick::Tick;

/// Default trailing window width, in seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 10;

/// Orchestrates per-symbol windows and analytics computation.
///
/// Ingestions for different symbols run in parallel; ingestions for the
/// same symbol serialize on that symbol's lock, so evict+append+compute
/// is atomic per symbol. The outer map lock is only held long enough to
/// look up or insert a symbol's slot.
pub struct AnalyticsEngine {
    window: Duration,
    symbols: RwLock<HashMap<String, Arc<Mutex<SymbolWindow>>>>,
}

impl AnalyticsEngine {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window: Duration::seconds(window_secs as i64),
            symbols: RwLock::new(HashMap::new()),
        }
    }

    /// Ingest one tick using the current wall clock and return a fresh
    /// snapshot of the symbol's window.
    pub fn ingest(&self, tick: Tick) -> Result<AnalyticsSnapshot, AppError> {
        self.ingest_at(tick, Utc::now())
    }

    /// Clock-injected ingest. Errs only if a prior panic poisoned a
    /// lock; a well-formed tick otherwise always yields a snapshot.
    pub fn ingest_at(
        &self,
        tick: Tick,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsSnapshot, AppError> {
        let symbol = tick.symbol.clone();
        let slot = self.slot(&symbol, now)?;

        let mut window = slot
            .lock()
            .map_err(|_| AppError::WindowPoisoned(symbol.clone()))?;
        window.apply(tick, now, self.window);

        let analytics = calculator::compute(window.ticks(), window.started_at(), now);
        Ok(AnalyticsSnapshot {
            symbol,
            analytics,
            ticks: window.ticks().to_vec(),
        })
    }

    /// Number of symbols currently tracked. Windows are never removed,
    /// so this only grows.
    pub fn symbol_count(&self) -> Result<usize, AppError> {
        Ok(self
            .symbols
            .read()
            .map_err(|_| AppError::SymbolMapPoisoned)?
            .len())
    }

    fn slot(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<Arc<Mutex<SymbolWindow>>, AppError> {
        if let Some(slot) = self
            .symbols
            .read()
            .map_err(|_| AppError::SymbolMapPoisoned)?
            .get(symbol)
        {
            return Ok(Arc::clone(slot));
        }

        // Two first ticks for the same symbol can race here; the write
        // lock makes one of them the creator and `started_at` sticks.
        let mut map = self.symbols.write().map_err(|_| AppError::SymbolMapPoisoned)?;
        Ok(Arc::clone(map.entry(symbol.to_string()).or_insert_with(
            || Arc::new(Mutex::new(SymbolWindow::new(now))),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn snapshot_for_new_symbol_has_one_tick() {
        let engine = AnalyticsEngine::new(DEFAULT_WINDOW_SECS);
        let now = base();
        let snapshot = engine
            .ingest_at(Tick::at("AAPL", 187.5, 900, now), now)
            .unwrap();

        assert_eq!(snapshot.symbol, "AAPL");
        assert_eq!(snapshot.ticks.len(), 1);
        assert!((snapshot.analytics.avg_price - 187.5).abs() < f64::EPSILON);
        assert_eq!(snapshot.analytics.price_standard_deviation, 0.0);
    }

    #[test]
    fn symbols_do_not_share_windows() {
        let engine = AnalyticsEngine::new(DEFAULT_WINDOW_SECS);
        let now = base();
        engine
            .ingest_at(Tick::at("AAPL", 100.0, 10, now), now)
            .unwrap();
        let snapshot = engine
            .ingest_at(Tick::at("MSFT", 300.0, 5, now), now)
            .unwrap();

        assert_eq!(snapshot.ticks.len(), 1);
        assert!((snapshot.analytics.avg_price - 300.0).abs() < f64::EPSILON);
        assert_eq!(engine.symbol_count().unwrap(), 2);
    }

    #[test]
    fn duration_tracks_first_observation() {
        let engine = AnalyticsEngine::new(DEFAULT_WINDOW_SECS);
        let t0 = base();
        engine.ingest_at(Tick::at("AAPL", 100.0, 10, t0), t0).unwrap();

        let t1 = t0 + Duration::seconds(7);
        let snapshot = engine
            .ingest_at(Tick::at("AAPL", 101.0, 10, t1), t1)
            .unwrap();
        assert_eq!(snapshot.analytics.timespan.duration_millis, 7000);
    }
}
