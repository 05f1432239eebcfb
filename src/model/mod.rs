//! Language-model capabilities used by the monitor
//!
//! Two narrow interfaces sit between the core and any model provider:
//! - [`SentimentClassifier`] turns a headline into a [`Sentiment`]
//! - [`InsightGenerator`] turns an [`InsightContext`] into a short narrative
//!
//! Both return a `Result`; callers branch on it rather than unwinding.

pub mod llm;

#[cfg(test)]
mod tests;

pub use llm::{LlmClient, LlmProvider};

use crate::error::{MonitorError, Result};
use crate::types::Sentiment;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Headline sentiment classifier
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classifier name for logging
    fn name(&self) -> &'static str;

    /// Classify a single headline
    async fn classify(&self, headline: &str) -> Result<Sentiment>;
}

/// Alert narrative generator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, context: &InsightContext) -> Result<String>;
}

/// Everything the generator is allowed to see about a fired trigger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightContext {
    pub ticker: String,
    pub current_price: Decimal,
    pub previous_price: Decimal,
    pub change_percent: Decimal,
    pub sentiment_summary: String,
    pub news_count: usize,
}

/// Stand-in used when no model is configured; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLlm;

#[async_trait]
impl SentimentClassifier for UnavailableLlm {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn classify(&self, _headline: &str) -> Result<Sentiment> {
        Err(MonitorError::Classification("LLM not configured".into()))
    }
}

#[async_trait]
impl InsightGenerator for UnavailableLlm {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn generate(&self, _context: &InsightContext) -> Result<String> {
        Err(MonitorError::Generation("LLM not configured".into()))
    }
}

/// Await `fut` for at most `limit`; overrunning is reported as [`MonitorError::Timeout`].
pub async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(MonitorError::Timeout {
            operation: operation.to_string(),
            secs: limit.as_secs(),
        }),
    }
}
