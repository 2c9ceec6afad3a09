use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::analytics::engine::DEFAULT_WINDOW_SECS;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub analytics: AnalyticsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub symbols: Vec<String>,
    pub interval_ms: u64,
    pub price_min: f64,
    pub price_max: f64,
    pub volume_min: u64,
    pub volume_max: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW_SECS
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl FeedConfig {
    /// Uppercased, trimmed, deduplicated symbol universe.
    pub fn symbol_universe(&self) -> Vec<String> {
        let mut out = Vec::new();
        for sym in &self.symbols {
            let s = sym.trim().to_ascii_uppercase();
            if !s.is_empty() && !out.iter().any(|v| v == &s) {
                out.push(s);
            }
        }
        out
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = Path::new("config/default.toml");
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;

        let config: Config =
            toml::from_str(&config_str).context("failed to parse config/default.toml")?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feed.symbol_universe().is_empty() {
            bail!("feed.symbols must contain at least one non-empty symbol");
        }
        if self.feed.interval_ms == 0 {
            bail!("feed.interval_ms must be > 0");
        }
        if !(self.feed.price_min > 0.0 && self.feed.price_max >= self.feed.price_min) {
            bail!("feed price band must satisfy 0 < price_min <= price_max");
        }
        if self.feed.volume_max < self.feed.volume_min {
            bail!("feed volume band must satisfy volume_min <= volume_max");
        }
        if self.analytics.window_secs == 0 {
            bail!("analytics.window_secs must be > 0");
        }
        self.bind_addr().map(|_| ())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("server.bind '{}' is not a socket address", self.server.bind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        let toml_str = r#"
[feed]
symbols = ["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA"]
interval_ms = 250
price_min = 100.0
price_max = 200.0
volume_min = 1000
volume_max = 10000

[analytics]
window_secs = 10

[server]
bind = "0.0.0.0:5000"

[logging]
level = "info"
"#;
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn parse_default_toml() {
        let config = sample();
        assert_eq!(config.feed.symbols.len(), 5);
        assert_eq!(config.feed.interval_ms, 250);
        assert_eq!(config.analytics.window_secs, 10);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr().unwrap().port(), 5000);
    }

    #[test]
    fn window_secs_defaults_when_omitted() {
        let toml_str = r#"
[feed]
symbols = ["AAPL"]
interval_ms = 250
price_min = 100.0
price_max = 200.0
volume_min = 1000
volume_max = 10000

[analytics]

[server]
bind = "127.0.0.1:5000"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.analytics.window_secs, DEFAULT_WINDOW_SECS);
    }

    #[test]
    fn symbol_universe_dedups_and_uppercases() {
        let mut config = sample();
        config.feed.symbols = vec![
            "aapl".to_string(),
            "AAPL".to_string(),
            "  ".to_string(),
            "msft".to_string(),
        ];
        assert_eq!(
            config.feed.symbol_universe(),
            vec!["AAPL".to_string(), "MSFT".to_string()]
        );
    }

    #[test]
    fn validate_rejects_bad_bands() {
        let mut config = sample();
        config.feed.price_min = 200.0;
        config.feed.price_max = 100.0;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.feed.volume_min = 500;
        config.feed.volume_max = 100;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.analytics.window_secs = 0;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.server.bind = "not-an-addr".to_string();
        assert!(config.validate().is_err());
    }
}
