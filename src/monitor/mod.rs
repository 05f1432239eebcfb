//! Event dispatch and runtime counters
//!
//! The [`Monitor`] owns the state store and both processors. Each inbound
//! event is handled on its own task, so a slow classifier call never holds up
//! price processing.


use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::model::{InsightGenerator, SentimentClassifier};
use crate::notify::AlertSink;
use crate::processor::{NewsOutcome, NewsProcessor, PriceOutcome, PriceProcessor};
use crate::state::StateStore;
use crate::trigger::{TriggerConfig, TriggerEngine};
use crate::types::InboundEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Running totals since startup
#[derive(Debug, Default)]
pub struct MonitorStats {
    pub prices_processed: AtomicU64,
    pub news_recorded: AtomicU64,
    pub news_discarded: AtomicU64,
    pub events_dropped: AtomicU64,
    pub alerts_fired: AtomicU64,
}

/// Point-in-time copy of [`MonitorStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub prices_processed: u64,
    pub news_recorded: u64,
    pub news_discarded: u64,
    pub events_dropped: u64,
    pub alerts_fired: u64,
}

impl MonitorStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            prices_processed: self.prices_processed.load(Ordering::Relaxed),
            news_recorded: self.news_recorded.load(Ordering::Relaxed),
            news_discarded: self.news_discarded.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            alerts_fired: self.alerts_fired.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct Monitor {
    store: StateStore,
    prices: PriceProcessor,
    news: NewsProcessor,
    stats: MonitorStats,
}

impl Monitor {
    pub fn new(
        config: &MonitorConfig,
        classifier: Arc<dyn SentimentClassifier>,
        generator: Arc<dyn InsightGenerator>,
        sink: Arc<dyn AlertSink>,
        call_timeout: Duration,
    ) -> Self {
        let store = StateStore::new();
        let engine = Arc::new(TriggerEngine::new(
            TriggerConfig::from(config),
            generator,
            sink,
            call_timeout,
        ));

        Self {
            prices: PriceProcessor::new(store.clone(), engine),
            news: NewsProcessor::new(
                store.clone(),
                classifier,
                config.news_ticker.clone(),
                config.max_news_history,
                call_timeout,
            ),
            store,
            stats: MonitorStats::default(),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Handle one event to completion. Never fails; outcomes are logged and counted.
    pub async fn handle(&self, event: InboundEvent) {
        match event {
            InboundEvent::Price(price) => match self.prices.process(&price).await {
                Ok(outcome) => {
                    MonitorStats::bump(&self.stats.prices_processed);
                    if let PriceOutcome::Triggered(_) = outcome {
                        MonitorStats::bump(&self.stats.alerts_fired);
                    }
                }
                Err(e) => self.record_failure("price", &e),
            },
            InboundEvent::News(news) => match self.news.process(&news).await {
                Ok(NewsOutcome::Recorded { .. }) => MonitorStats::bump(&self.stats.news_recorded),
                Ok(NewsOutcome::Unclassified) => {
                    tracing::warn!("Discarding headline with unrecognised sentiment: '{}'", news.headline);
                    MonitorStats::bump(&self.stats.news_discarded);
                }
                Err(e) => self.record_failure("news", &e),
            },
        }
    }

    fn record_failure(&self, kind: &str, err: &MonitorError) {
        match err {
            MonitorError::Validation(_) => {
                tracing::warn!("Skipping invalid {} message: {}", kind, err);
                MonitorStats::bump(&self.stats.events_dropped);
            }
            e if e.is_external() => {
                tracing::error!("Enrichment failed for {} event: {}", kind, e);
                MonitorStats::bump(&self.stats.news_discarded);
            }
            e => {
                tracing::error!("Unexpected error handling {} event: {}", kind, e);
                MonitorStats::bump(&self.stats.events_dropped);
            }
        }
    }

    /// Consume events until the channel closes, one task per event.
    ///
    /// Returns after every spawned task has finished.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<InboundEvent>) {
        let mut tasks = JoinSet::new();

        while let Some(event) = rx.recv().await {
            let monitor = Arc::clone(&self);
            tasks.spawn(async move { monitor.handle(event).await });

            // Reap finished tasks so the set doesn't grow without bound
            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    tracing::error!("Event task panicked: {}", e);
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Event task panicked: {}", e);
            }
        }
    }

    pub fn log_stats(&self) {
        let s = self.stats();
        tracing::info!(
            prices = s.prices_processed,
            news_recorded = s.news_recorded,
            news_discarded = s.news_discarded,
            dropped = s.events_dropped,
            alerts = s.alerts_fired,
            tickers = self.store.len(),
            "Monitor stats"
        );
    }
}
