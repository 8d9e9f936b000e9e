use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub cache: CacheSettings,
    pub behavior: BehaviorSettings,
    pub narrator: NarratorSettings,
    pub logging: LoggingSettings,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.behavior.validate()?;
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Connection parameters for the PostgreSQL record store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/edgeiq".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Time-to-live settings for the read-through cache in front of the metrics views.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Summary and equity curve.
    pub summary_ttl_secs: u64,
    /// Session and strategy breakdowns.
    pub grouped_ttl_secs: u64,
    /// Paginated trade listings.
    pub listing_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            summary_ttl_secs: 120,
            grouped_ttl_secs: 180,
            listing_ttl_secs: 60,
        }
    }
}

/// Thresholds for the pattern detector, the scorers, and the trend aggregator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BehaviorSettings {
    /// Look-back window (by creation time) for the per-run detectors.
    pub lookback_hours: i64,
    /// Number of consecutive trades that make up an overtrading burst.
    pub overtrading_trade_count: usize,
    /// Maximum span of such a burst.
    pub overtrading_span_minutes: i64,
    /// A trade this soon after a loss counts as revenge trading.
    pub revenge_gap_minutes: i64,
    /// How many of the most recent trades feed the position-size check.
    pub risk_sample_size: usize,
    pub risk_min_trades: usize,
    /// Coefficient of variation (percent) above which sizing is inconsistent.
    pub risk_cv_threshold_pct: Decimal,
    /// Share of window trades with a negative emotion that flags emotional bias.
    pub emotional_bias_ratio: Decimal,
    pub consistency_sample_size: usize,
    pub consistency_window: usize,
    /// Returned when fewer than `consistency_window` closed trades exist.
    pub consistency_default: Decimal,
    pub trend_sample_size: usize,
    pub trend_series_len: usize,
    /// Pending analysis jobs held by the background queue.
    pub queue_capacity: usize,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            lookback_hours: 24,
            overtrading_trade_count: 5,
            overtrading_span_minutes: 240,
            revenge_gap_minutes: 15,
            risk_sample_size: 20,
            risk_min_trades: 5,
            risk_cv_threshold_pct: dec!(50),
            emotional_bias_ratio: dec!(0.3),
            consistency_sample_size: 30,
            consistency_window: 5,
            consistency_default: dec!(50),
            trend_sample_size: 30,
            trend_series_len: 7,
            queue_capacity: 256,
        }
    }
}

impl BehaviorSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("behavior.lookback_hours", self.lookback_hours > 0),
            ("behavior.overtrading_trade_count", self.overtrading_trade_count >= 2),
            ("behavior.overtrading_span_minutes", self.overtrading_span_minutes > 0),
            ("behavior.revenge_gap_minutes", self.revenge_gap_minutes > 0),
            ("behavior.risk_sample_size", self.risk_sample_size > 0),
            ("behavior.risk_min_trades", self.risk_min_trades > 0),
            ("behavior.consistency_window", self.consistency_window > 0),
            (
                "behavior.consistency_sample_size",
                self.consistency_sample_size >= self.consistency_window,
            ),
            ("behavior.trend_sample_size", self.trend_sample_size > 0),
            ("behavior.queue_capacity", self.queue_capacity > 0),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, ok)| !ok) {
            return Err(ConfigError::ValidationError(format!(
                "{name} is out of range"
            )));
        }
        if self.emotional_bias_ratio <= Decimal::ZERO || self.emotional_bias_ratio > Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "behavior.emotional_bias_ratio must be in (0, 1]".to_string(),
            ));
        }
        if self.consistency_default < Decimal::ZERO
            || self.consistency_default > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::ValidationError(
                "behavior.consistency_default must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for the external narrative generator (an OpenAI-compatible chat API).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarratorSettings {
    /// Leaving the key empty disables report generation.
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for NarratorSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.4,
            max_tokens: 800,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
        }
    }
}
