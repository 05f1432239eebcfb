//! Alert trigger engine
//!
//! The decision half ([`evaluate`], [`TriggerEngine::check`]) runs inside the
//! ticker's exclusive section and closes the cooldown gate before anything
//! suspends. The side-effect half ([`TriggerEngine::fire`]) runs after the lock
//! is released: it asks for an insight and hands the alert to the sink.


use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::model::{bounded, InsightContext, InsightGenerator};
use crate::notify::AlertSink;
use crate::state::InstrumentState;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

/// Threshold and cooldown parameters
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Absolute percentage move that qualifies (inclusive)
    pub threshold_pct: Decimal,
    /// Gate stays closed while `now - last_alert <= cooldown`
    pub cooldown: Duration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for TriggerConfig {
    fn from(cfg: &MonitorConfig) -> Self {
        Self {
            threshold_pct: cfg.price_change_threshold_pct,
            cooldown: cfg.alert_cooldown(),
        }
    }
}

/// Outcome of one trigger check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Fire,
    BelowThreshold,
    CoolingDown { remaining: Duration },
}

/// Pure threshold + cooldown decision
pub fn evaluate(
    change_percent: Decimal,
    last_alert_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &TriggerConfig,
) -> Decision {
    if change_percent.abs() < config.threshold_pct {
        return Decision::BelowThreshold;
    }

    match last_alert_time {
        Some(last) if now - last <= config.cooldown => Decision::CoolingDown {
            remaining: config.cooldown - (now - last),
        },
        _ => Decision::Fire,
    }
}

/// Percentage change from `previous` to `current`
///
/// Fails with a validation error when `previous` is not positive or the ratio
/// does not fit in a `Decimal`.
pub fn percent_change(previous: Decimal, current: Decimal) -> Result<Decimal> {
    if previous <= Decimal::ZERO {
        return Err(MonitorError::Validation(format!(
            "previous price must be positive, got {}",
            previous
        )));
    }

    current
        .checked_sub(previous)
        .and_then(|diff| diff.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| {
            MonitorError::Validation(format!(
                "price change from {} to {} overflows",
                previous, current
            ))
        })
}

/// A trigger that has closed its cooldown gate and awaits narrative + delivery
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAlert {
    pub context: InsightContext,
    pub fired_at: DateTime<Utc>,
}

/// Outbound alert record
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: uuid::Uuid,
    pub ticker: String,
    pub current_price: Decimal,
    pub previous_price: Decimal,
    pub change_percent: Decimal,
    pub sentiment_summary: String,
    pub news_count: usize,
    pub insight: Option<String>,
    pub fired_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(pending: PendingAlert, insight: Option<String>) -> Self {
        let PendingAlert { context, fired_at } = pending;
        Self {
            id: uuid::Uuid::new_v4(),
            ticker: context.ticker,
            current_price: context.current_price,
            previous_price: context.previous_price,
            change_percent: context.change_percent,
            sentiment_summary: context.sentiment_summary,
            news_count: context.news_count,
            insight,
            fired_at,
        }
    }
}

/// Threshold/cooldown gate plus alert emission
pub struct TriggerEngine {
    config: TriggerConfig,
    generator: Arc<dyn InsightGenerator>,
    sink: Arc<dyn AlertSink>,
    call_timeout: std::time::Duration,
}

impl TriggerEngine {
    pub fn new(
        config: TriggerConfig,
        generator: Arc<dyn InsightGenerator>,
        sink: Arc<dyn AlertSink>,
        call_timeout: std::time::Duration,
    ) -> Self {
        Self {
            config,
            generator,
            sink,
            call_timeout,
        }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Decide under the ticker's lock. On fire the cooldown gate is closed here.
    pub fn check(
        &self,
        state: &mut InstrumentState,
        ticker: &str,
        current: Decimal,
        previous: Decimal,
        change_percent: Decimal,
        now: DateTime<Utc>,
    ) -> Option<PendingAlert> {
        match evaluate(change_percent, state.last_alert_time, now, &self.config) {
            Decision::Fire => {}
            Decision::BelowThreshold => return None,
            Decision::CoolingDown { remaining } => {
                tracing::debug!(
                    ticker,
                    change = %change_percent.round_dp(2),
                    remaining_secs = remaining.num_seconds(),
                    "Trigger suppressed by cooldown"
                );
                return None;
            }
        }

        tracing::warn!(
            "🚨 TRIGGER: Price change {:.2}% for {} detected!",
            change_percent,
            ticker
        );
        state.last_alert_time = Some(now);

        Some(PendingAlert {
            context: InsightContext {
                ticker: ticker.to_string(),
                current_price: current,
                previous_price: previous,
                change_percent,
                sentiment_summary: state.sentiment_summary(),
                news_count: state.news_count(),
            },
            fired_at: now,
        })
    }

    /// Request an insight and deliver the alert. Must be called without any state lock held.
    pub async fn fire(&self, pending: PendingAlert) -> Alert {
        tracing::info!("Calling {} for proactive insight...", self.generator.name());
        let insight = match bounded(
            "insight generation",
            self.call_timeout,
            self.generator.generate(&pending.context),
        )
        .await
        {
            Ok(text) => {
                tracing::info!("💡 Generated Insight:\n{}", text);
                Some(text)
            }
            Err(e) => {
                tracing::error!(ticker = %pending.context.ticker, "Error generating insight: {}", e);
                None
            }
        };

        let alert = Alert::new(pending, insight);
        if let Err(e) = self.sink.deliver(&alert).await {
            tracing::error!(ticker = %alert.ticker, "Alert delivery failed: {}", e);
        }
        alert
    }
}
