//! Configuration management

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    pub llm: Option<LlmConfig>,
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Number of recent news sentiments kept per ticker
    pub max_news_history: usize,
    /// Absolute price change (%) that arms an alert
    pub price_change_threshold_pct: Decimal,
    /// Minimum spacing between alerts for one ticker (seconds)
    pub alert_cooldown_secs: u64,
    /// Ticker every news headline is attributed to
    pub news_ticker: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (gemini, anthropic, openai, deepseek, ollama, compatible)
    pub provider: String,
    /// API key
    #[serde(default)]
    pub api_key: String,
    /// Model name (provider default when omitted)
    pub model: Option<String>,
    /// Base URL for OpenAI-compatible endpoints
    pub base_url: Option<String>,
    /// Upper bound on any single classifier/generator call
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter when RUST_LOG is unset
    pub level: String,
}

fn default_llm_timeout_secs() -> u64 {
    30
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_news_history: 3,
            price_change_threshold_pct: Decimal::new(50, 1), // 5.0%
            alert_cooldown_secs: 600,                        // 10 minutes
            news_ticker: "NVDA".to_string(),
        }
    }
}

/// Largest cooldown a `chrono::Duration` can hold
pub const MAX_ALERT_COOLDOWN_SECS: u64 = (i64::MAX / 1000) as u64;

impl MonitorConfig {
    /// Saturates at [`MAX_ALERT_COOLDOWN_SECS`]; `validate` rejects anything larger
    pub fn alert_cooldown(&self) -> chrono::Duration {
        i64::try_from(self.alert_cooldown_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::MonitorError;

        if self.max_news_history == 0 {
            return Err(MonitorError::Config("max_news_history must be at least 1".into()));
        }
        if self.price_change_threshold_pct <= Decimal::ZERO {
            return Err(MonitorError::Config(
                "price_change_threshold_pct must be positive".into(),
            ));
        }
        if self.news_ticker.trim().is_empty() {
            return Err(MonitorError::Config("news_ticker must not be empty".into()));
        }
        if self.alert_cooldown_secs > MAX_ALERT_COOLDOWN_SECS {
            return Err(MonitorError::Config(format!(
                "alert_cooldown_secs must be at most {}",
                MAX_ALERT_COOLDOWN_SECS
            )));
        }
        Ok(())
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, overlaid with `TICKER_WATCH__*` env vars
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("TICKER_WATCH").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.monitor.validate()?;
        Ok(config)
    }

    /// Load from default locations, falling back to built-in defaults
    pub fn load_default() -> anyhow::Result<Self> {
        let paths = ["config.toml", "~/.config/ticker-watch/config.toml"];

        for path in paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::load(expanded.as_ref());
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load from an explicit path if it exists, otherwise from default locations
    pub fn resolve(path: &str) -> anyhow::Result<Self> {
        let expanded = shellexpand::tilde(path);
        if Path::new(expanded.as_ref()).exists() {
            Self::load(expanded.as_ref())
        } else {
            Self::load_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use rust_decimal_macros::dec;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_monitor_defaults() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.max_news_history, 3);
        assert_eq!(cfg.price_change_threshold_pct, dec!(5.0));
        assert_eq!(cfg.alert_cooldown(), chrono::Duration::minutes(10));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_oversized_cooldown_rejected() {
        let mut cfg = MonitorConfig {
            alert_cooldown_secs: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(MonitorError::Config(_))));
        assert_eq!(cfg.alert_cooldown(), chrono::Duration::MAX);

        cfg.alert_cooldown_secs = MAX_ALERT_COOLDOWN_SECS + 1;
        assert!(cfg.validate().is_err());

        cfg.alert_cooldown_secs = MAX_ALERT_COOLDOWN_SECS;
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.alert_cooldown().num_seconds(), MAX_ALERT_COOLDOWN_SECS as i64);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.monitor.news_ticker, "NVDA");
        assert!(cfg.llm.is_none());
        assert!(cfg.telegram.is_none());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_partial_monitor_section() {
        let cfg = parse(
            r#"
            [monitor]
            news_ticker = "AAPL"
            alert_cooldown_secs = 60
            "#,
        );
        assert_eq!(cfg.monitor.news_ticker, "AAPL");
        assert_eq!(cfg.monitor.alert_cooldown_secs, 60);
        assert_eq!(cfg.monitor.max_news_history, 3);
    }

    #[test]
    fn test_llm_section() {
        let cfg = parse(
            r#"
            [llm]
            provider = "gemini"
            api_key = "k"
            "#,
        );
        let llm = cfg.llm.unwrap();
        assert_eq!(llm.provider, "gemini");
        assert_eq!(llm.timeout(), Duration::from_secs(30));
        assert!(llm.model.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_history() {
        let cfg = MonitorConfig {
            max_news_history: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_ticker() {
        let cfg = MonitorConfig {
            news_ticker: "  ".to_string(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
