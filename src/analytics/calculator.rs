//! Pure statistics over one symbol's window. No state, no I/O; the same
//! inputs always produce an identical bundle.
//!
//! Arithmetic degeneracies (empty input, zero mean, zero total volume,
//! samples below a statistic's minimum) all resolve to 0 rather than
//! signaling an error, so a snapshot is always available.

use chrono::{DateTime, Utc};

use crate::model::snapshot::{SymbolAnalytics, Timespan};
use crate::model::tick::Tick;

/// Compute the full statistics bundle over a window's ticks.
///
/// `ticks` is in insertion order; every statistic except the timespan
/// bounds reads it that way.
pub fn compute(ticks: &[Tick], started_at: DateTime<Utc>, now: DateTime<Utc>) -> SymbolAnalytics {
    let prices: Vec<f64> = ticks.iter().map(|t| t.price).collect();
    let volumes: Vec<f64> = ticks.iter().map(|t| t.volume as f64).collect();

    SymbolAnalytics {
        avg_price: mean(&prices),
        median_price: median(&prices),
        price_standard_deviation: sample_std_dev(&prices),
        price_volatility: volatility(&prices),
        volume_trend: volume_trend(&volumes),
        momentum_indicator: momentum(&prices),
        volume_weighted_average_price: vwap(ticks),
        timespan: timespan(ticks, started_at, now),
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sorted midpoint; the mean of the two middles when the count is even.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Coefficient of variation: stddev as a percentage of the mean.
pub fn volatility(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    let m = mean(prices);
    if m == 0.0 {
        return 0.0;
    }
    sample_std_dev(prices) / m * 100.0
}

/// Least-squares slope of volume against rank 1..n, via the closed-form
/// sums for x = 1..n.
pub fn volume_trend(volumes: &[f64]) -> f64 {
    let n = volumes.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let sum_x = nf * (nf + 1.0) / 2.0;
    let sum_x_sq = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 6.0;
    let sum_y: f64 = volumes.iter().sum();
    let sum_xy: f64 = volumes
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 + 1.0) * v)
        .sum();

    (nf * sum_xy - sum_x * sum_y) / (nf * sum_x_sq - sum_x * sum_x)
}

/// Percent price change from the first to the last retained tick, in
/// insertion order (not time order).
pub fn momentum(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    let first = prices[0];
    let last = prices[prices.len() - 1];
    if first == 0.0 {
        return 0.0;
    }
    (last - first) / first * 100.0
}

/// Volume-weighted average price: sum(price * volume) / sum(volume).
pub fn vwap(ticks: &[Tick]) -> f64 {
    let total_volume: f64 = ticks.iter().map(|t| t.volume as f64).sum();
    if total_volume == 0.0 {
        return 0.0;
    }
    let total_value: f64 = ticks.iter().map(|t| t.price * t.volume as f64).sum();
    total_value / total_volume
}

fn timespan(ticks: &[Tick], started_at: DateTime<Utc>, now: DateTime<Utc>) -> Timespan {
    // Bounds re-sort by timestamp, independent of insertion order.
    let start = ticks.iter().map(|t| t.timestamp).min().unwrap_or(now);
    let end = ticks.iter().map(|t| t.timestamp).max().unwrap_or(now);
    Timespan {
        start,
        end,
        duration_millis: (now - started_at).num_milliseconds(),
    }
}
