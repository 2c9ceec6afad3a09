use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::tick::Tick;

/// Wall-clock span covered by a snapshot.
///
/// `start` and `end` come from the time-sorted earliest and latest
/// retained ticks. `duration_millis` is elapsed time since the symbol
/// was first observed, not the width of the current window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timespan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_millis: i64,
}

/// Statistics bundle computed over one symbol's current window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolAnalytics {
    pub avg_price: f64,
    pub median_price: f64,
    pub price_standard_deviation: f64,
    pub price_volatility: f64,
    pub volume_trend: f64,
    pub momentum_indicator: f64,
    pub volume_weighted_average_price: f64,
    pub timespan: Timespan,
}

/// Output record handed to persistence/push collaborators. Produced
/// fresh on every ingestion; the caller owns it thereafter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub symbol: String,
    pub analytics: SymbolAnalytics,
    /// Full tick list currently in the window, for audit and debugging
    /// downstream.
    pub ticks: Vec<Tick>,
}
