use chrono::{DateTime, Duration, Utc};

use crate::model::tick::Tick;

/// Trailing time window of ticks for a single symbol.
///
/// Eviction is lazy: stale ticks are only purged when the next tick for
/// this symbol arrives, so a symbol that goes quiet keeps its last
/// window (and its last snapshot stays frozen) until ticks resume.
#[derive(Debug, Clone)]
pub struct SymbolWindow {
    ticks: Vec<Tick>,
    started_at: DateTime<Utc>,
}

impl SymbolWindow {
    /// State for a newly observed symbol. `started_at` is fixed here
    /// and never moves afterwards.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            ticks: Vec::new(),
            started_at: now,
        }
    }

    /// Evict every tick older than `now - window`, then append `tick`.
    ///
    /// The incoming tick is appended without checking its own timestamp
    /// against the cutoff, so an out-of-order tick older than the
    /// window sits in the buffer until the next ingestion sweeps it.
    pub fn apply(&mut self, tick: Tick, now: DateTime<Utc>, window: Duration) {
        let cutoff = now - window;
        self.ticks.retain(|t| t.timestamp >= cutoff);
        self.ticks.push(tick);
    }

    /// Retained ticks, in insertion order (not time order).
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    /// Instant this symbol was first observed. Not the window start.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
