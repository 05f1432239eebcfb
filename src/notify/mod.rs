//! Alert delivery
//!
//! Every fired trigger is written to the log as a structured record. When a
//! Telegram bot is configured the alert is also sent there.


use crate::config::TelegramConfig;
use crate::error::Result;
use crate::trigger::Alert;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;

/// Destination for fired alerts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &Alert) -> Result<()>;
}

/// Log + Telegram notifier
#[derive(Clone)]
pub struct Notifier {
    http: Client,
    bot_token: String,
    chat_id: String,
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct TelegramMessage {
    chat_id: String,
    text: String,
    parse_mode: String,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: Self::client(),
            bot_token,
            chat_id,
            enabled: true,
        }
    }

    /// Create a log-only notifier (for when Telegram is not configured)
    pub fn disabled() -> Self {
        Self {
            http: Self::client(),
            bot_token: String::new(),
            chat_id: String::new(),
            enabled: false,
        }
    }

    pub fn from_config(config: Option<&TelegramConfig>) -> Self {
        match config {
            Some(tg) => Self::new(tg.bot_token.clone(), tg.chat_id.clone()),
            None => Self::disabled(),
        }
    }

    fn client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Send a raw message (HTML format)
    pub async fn send(&self, text: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let msg = TelegramMessage {
            chat_id: self.chat_id.clone(),
            text: text.to_string(),
            parse_mode: "HTML".to_string(),
        };

        let response = self.http.post(&url).json(&msg).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Telegram send failed: {}", error_text);
        }

        Ok(())
    }

    /// Notify monitor startup
    pub async fn startup(&self, tickers: &str) -> Result<()> {
        let text = format!(
            "🤖 <b>Ticker Watch Started</b>\n\n\
            News routed to: <code>{}</code>\n\
            Time: {}",
            escape_html(tickers),
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC"),
        );

        self.send(&text).await
    }

    /// Notify monitor shutdown
    pub async fn shutdown(&self, reason: &str) -> Result<()> {
        let text = format!(
            "🛑 <b>Ticker Watch Stopped</b>\n\n\
            Reason: {}\n\
            Time: {}",
            escape_html(reason),
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC"),
        );

        self.send(&text).await
    }
}

#[async_trait]
impl AlertSink for Notifier {
    async fn deliver(&self, alert: &Alert) -> Result<()> {
        tracing::warn!(
            alert_id = %alert.id,
            ticker = %alert.ticker,
            change_pct = %alert.change_percent.round_dp(2),
            sentiment = %alert.sentiment_summary,
            news_count = alert.news_count,
            insight = alert.insight.as_deref().unwrap_or("<unavailable>"),
            "Price alert"
        );

        self.send(&format_alert(alert)).await
    }
}

/// Render an alert as Telegram HTML
pub fn format_alert(alert: &Alert) -> String {
    let direction = if alert.change_percent >= Decimal::ZERO { "📈" } else { "📉" };
    let insight = alert
        .insight
        .as_deref()
        .map(|text| escape_html(&truncate(text, 600)))
        .unwrap_or_else(|| "<i>No insight available</i>".to_string());

    format!(
        "🚨 <b>{} Price Alert</b>\n\n\
        {} Change: <code>{:+.2}%</code>\n\
        Price: <code>${:.2}</code> (was <code>${:.2}</code>)\n\
        News ({}): {}\n\n\
        💡 {}",
        escape_html(&alert.ticker),
        direction,
        alert.change_percent,
        alert.current_price,
        alert.previous_price,
        alert.news_count,
        escape_html(&alert.sentiment_summary),
        insight,
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}
