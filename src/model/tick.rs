use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of price and volume for a symbol at an instant.
///
/// Timestamps travel as RFC 3339 strings on the wire; `chrono`'s serde
/// support handles both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    pub volume: u64,
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    /// Create a tick stamped with the current wall clock.
    pub fn new(symbol: impl Into<String>, price: f64, volume: u64) -> Self {
        Self::at(symbol, price, volume, Utc::now())
    }

    /// Create a tick with an explicit timestamp.
    pub fn at(symbol: impl Into<String>, price: f64, volume: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            volume,
            timestamp,
        }
    }
}
