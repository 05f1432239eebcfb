//! Per-instrument state store
//!
//! Holds one [`InstrumentState`] per ticker and funnels every mutation through
//! a per-key lock. Closures passed to [`StateStore::with_lock`] are synchronous,
//! so an exclusive section can never straddle a network call.


use crate::types::Sentiment;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

/// Derived state for one instrument
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstrumentState {
    pub last_price: Option<Decimal>,
    /// (timestamp, sentiment), newest first
    pub sentiment_window: Vec<(DateTime<Utc>, Sentiment)>,
    pub last_alert_time: Option<DateTime<Utc>>,
}

impl InstrumentState {
    /// Insert a classified headline, keeping the window sorted newest-first and bounded
    pub fn record_sentiment(
        &mut self,
        timestamp: DateTime<Utc>,
        sentiment: Sentiment,
        max_history: usize,
    ) {
        debug_assert!(sentiment.is_definite(), "only definite sentiments are stored");

        self.sentiment_window.push((timestamp, sentiment));
        // Stable sort keeps arrival order among equal timestamps
        self.sentiment_window.sort_by(|a, b| b.0.cmp(&a.0));
        self.sentiment_window.truncate(max_history);

        debug_assert!(self.sentiment_window.len() <= max_history);
        debug_assert!(self
            .sentiment_window
            .windows(2)
            .all(|pair| pair[0].0 >= pair[1].0));
    }

    /// Comma-joined labels, newest first
    pub fn sentiment_summary(&self) -> String {
        if self.sentiment_window.is_empty() {
            return NO_RECENT_NEWS.to_string();
        }
        self.sentiment_window
            .iter()
            .map(|(_, s)| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn news_count(&self) -> usize {
        self.sentiment_window.len()
    }
}

/// Summary used when no headline has been classified yet
pub const NO_RECENT_NEWS: &str = "No recent news";

type Slot = Arc<Mutex<InstrumentState>>;

/// Keyed store of instrument state with per-key exclusivity
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    slots: Arc<RwLock<HashMap<String, Slot>>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the record for `ticker`, creating an empty one on first reference
    pub fn get_or_create(&self, ticker: &str) -> Slot {
        if let Some(slot) = self.slots.read().get(ticker) {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write();
        // Another task may have inserted between the read and write guards
        let slot = slots.entry(ticker.to_string()).or_insert_with(|| {
            tracing::debug!(ticker, "Created instrument state");
            Arc::new(Mutex::new(InstrumentState::default()))
        });
        Arc::clone(slot)
    }

    /// Run `f` with exclusive access to the record for `ticker`.
    ///
    /// Calls for the same ticker are linearized; different tickers never contend
    /// beyond the brief map lookup.
    pub fn with_lock<R>(&self, ticker: &str, f: impl FnOnce(&mut InstrumentState) -> R) -> R {
        let slot = self.get_or_create(ticker);
        let mut state = slot.lock();
        f(&mut state)
    }

    /// Copy of the record, if the ticker has been seen
    pub fn snapshot(&self, ticker: &str) -> Option<InstrumentState> {
        let slot = self.slots.read().get(ticker).cloned()?;
        let state = slot.lock().clone();
        Some(state)
    }

    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.slots.read().keys().cloned().collect();
        tickers.sort();
        tickers
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}
