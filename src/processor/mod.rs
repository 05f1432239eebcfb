//! Price and news event processors
//!
//! Each processor folds one validated event into the state store. Network
//! calls (classifier, insight generator) always happen outside the ticker's
//! exclusive section: classification before the lock is taken, insight
//! generation after it is released.


use crate::error::Result;
use crate::model::{bounded, SentimentClassifier};
use crate::state::{InstrumentState, StateStore};
use crate::trigger::{percent_change, Alert, PendingAlert, TriggerEngine};
use crate::types::{NewsEvent, PriceEvent, Sentiment};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// What a price event did to its ticker
#[derive(Debug, Clone)]
pub enum PriceOutcome {
    /// First sample for the ticker; nothing to diff against
    Seeded,
    /// Price recorded, trigger did not fire
    Updated { change_percent: Decimal },
    /// Price recorded and an alert was emitted
    Triggered(Alert),
}

/// What a news event did to the routed ticker
#[derive(Debug, Clone, PartialEq)]
pub enum NewsOutcome {
    Recorded { sentiment: Sentiment, window_len: usize },
    /// Classifier answered but gave no usable label
    Unclassified,
}

/// Folds price samples into state and runs the trigger check
pub struct PriceProcessor {
    store: StateStore,
    engine: Arc<TriggerEngine>,
}

impl PriceProcessor {
    pub fn new(store: StateStore, engine: Arc<TriggerEngine>) -> Self {
        Self { store, engine }
    }

    pub async fn process(&self, event: &PriceEvent) -> Result<PriceOutcome> {
        self.process_at(event, Utc::now()).await
    }

    /// Process with an explicit decision time
    pub async fn process_at(&self, event: &PriceEvent, now: DateTime<Utc>) -> Result<PriceOutcome> {
        event.validate()?;
        tracing::info!("Received Stock: {} Price: ${:.2}", event.ticker, event.price);

        let ticker = event.ticker.as_str();
        let folded = self
            .store
            .with_lock(ticker, |state| self.fold(state, ticker, event.price, now))?;

        match folded {
            PriceFold::Seeded => {
                tracing::info!("Initialized price state for {}", ticker);
                Ok(PriceOutcome::Seeded)
            }
            PriceFold::Updated { change_percent, pending: None } => {
                Ok(PriceOutcome::Updated { change_percent })
            }
            PriceFold::Updated { pending: Some(pending), .. } => {
                Ok(PriceOutcome::Triggered(self.engine.fire(pending).await))
            }
        }
    }

    /// The whole price step for one ticker; runs under its lock.
    /// On error the state is left untouched.
    fn fold(
        &self,
        state: &mut InstrumentState,
        ticker: &str,
        current: Decimal,
        now: DateTime<Utc>,
    ) -> Result<PriceFold> {
        let Some(previous) = state.last_price else {
            state.last_price = Some(current);
            return Ok(PriceFold::Seeded);
        };

        let change_percent = percent_change(previous, current)?;
        state.last_price = Some(current);
        tracing::info!("{} Price Change: {:.2}%", ticker, change_percent);

        let pending = self
            .engine
            .check(state, ticker, current, previous, change_percent, now);
        Ok(PriceFold::Updated {
            change_percent,
            pending,
        })
    }
}

enum PriceFold {
    Seeded,
    Updated {
        change_percent: Decimal,
        pending: Option<PendingAlert>,
    },
}

/// Classifies headlines and folds them into the routed ticker's sentiment window
pub struct NewsProcessor {
    store: StateStore,
    classifier: Arc<dyn SentimentClassifier>,
    /// Every headline is attributed to this ticker
    route_ticker: String,
    max_history: usize,
    call_timeout: Duration,
}

impl NewsProcessor {
    pub fn new(
        store: StateStore,
        classifier: Arc<dyn SentimentClassifier>,
        route_ticker: impl Into<String>,
        max_history: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            classifier,
            route_ticker: route_ticker.into(),
            max_history,
            call_timeout,
        }
    }

    pub fn route_ticker(&self) -> &str {
        &self.route_ticker
    }

    pub async fn process(&self, event: &NewsEvent) -> Result<NewsOutcome> {
        event.validate()?;
        tracing::info!("Received News: '{}' ({})", event.headline, event.source);

        // Touches no shared state; must finish before the lock is taken
        let sentiment = bounded(
            "sentiment classification",
            self.call_timeout,
            self.classifier.classify(&event.headline),
        )
        .await?;
        tracing::info!("Analyzed Sentiment: {}", sentiment);

        if !sentiment.is_definite() {
            return Ok(NewsOutcome::Unclassified);
        }

        let (window_len, labels) = self.store.with_lock(&self.route_ticker, |state| {
            state.record_sentiment(event.timestamp, sentiment, self.max_history);
            (state.news_count(), state.sentiment_summary())
        });
        tracing::info!("Updated sentiments for {}: [{}]", self.route_ticker, labels);

        Ok(NewsOutcome::Recorded {
            sentiment,
            window_len,
        })
    }
}
