//! Core event and sentiment types

use crate::error::{MonitorError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Price sample for a watched instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEvent {
    pub ticker: String,
    pub price: Decimal,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl PriceEvent {
    pub fn new(ticker: impl Into<String>, price: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            price,
            timestamp: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(MonitorError::Validation("empty ticker".into()));
        }
        if self.price <= Decimal::ZERO {
            return Err(MonitorError::Validation(format!(
                "non-positive price {} for {}",
                self.price, self.ticker
            )));
        }
        Ok(())
    }
}

/// News headline, attributed to the configured ticker downstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub headline: String,
    #[serde(default = "unknown_source")]
    pub source: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

fn unknown_source() -> String {
    "Unknown Source".to_string()
}

impl NewsEvent {
    pub fn new(headline: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            source: source.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.headline.trim().is_empty() {
            return Err(MonitorError::Validation("empty headline".into()));
        }
        Ok(())
    }
}

/// Decoded record from either inbound stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InboundEvent {
    Price(PriceEvent),
    News(NewsEvent),
}

impl InboundEvent {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Price(e) => e.validate(),
            Self::News(e) => e.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Price(_) => "price",
            Self::News(_) => "news",
        }
    }
}

/// Headline sentiment as reported by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Unknown,
}

impl Sentiment {
    /// Labels recognised in classifier output, in match priority order
    pub const LABELS: [Sentiment; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Only definite labels go into a sentiment window
    pub fn is_definite(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Extract a label from free-form model output.
    ///
    /// Whole-word matches win over substring matches; anything else is `Unknown`.
    /// Words are whitespace-separated, so `"POSITIVE,"` is not the word `POSITIVE`.
    pub fn parse_response(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        let words: Vec<&str> = upper.split_whitespace().collect();

        Self::LABELS
            .iter()
            .find(|label| words.contains(&label.as_str()))
            .or_else(|| Self::LABELS.iter().find(|label| upper.contains(label.as_str())))
            .copied()
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_event_validation() {
        assert!(PriceEvent::new("NVDA", dec!(125.50)).validate().is_ok());
        assert!(PriceEvent::new("", dec!(125.50)).validate().is_err());
        assert!(PriceEvent::new("NVDA", dec!(0)).validate().is_err());
        assert!(PriceEvent::new("NVDA", dec!(-1)).validate().is_err());
    }

    #[test]
    fn test_news_event_validation() {
        assert!(NewsEvent::new("NVIDIA announces new chip", "Reuters").validate().is_ok());
        assert!(NewsEvent::new("   ", "Reuters").validate().is_err());
    }

    #[test]
    fn test_inbound_event_tagged_json() {
        let json = r#"{"kind":"price","ticker":"NVDA","price":125.5,"timestamp":"2024-05-01T12:00:00Z"}"#;
        let event: InboundEvent = serde_json::from_str(json).unwrap();
        match event {
            InboundEvent::Price(p) => {
                assert_eq!(p.ticker, "NVDA");
                assert_eq!(p.price, dec!(125.5));
            }
            other => panic!("expected price event, got {:?}", other),
        }
    }

    #[test]
    fn test_news_defaults_when_fields_missing() {
        let json = r#"{"kind":"news","headline":"Chip demand surges"}"#;
        let event: InboundEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), "news");
        if let InboundEvent::News(n) = event {
            assert_eq!(n.source, "Unknown Source");
        }
    }

    #[test]
    fn test_sentiment_exact_word() {
        assert_eq!(Sentiment::parse_response("POSITIVE"), Sentiment::Positive);
        assert_eq!(Sentiment::parse_response(" negative\n"), Sentiment::Negative);
        assert_eq!(Sentiment::parse_response("Sentiment: Neutral."), Sentiment::Neutral);
    }

    #[test]
    fn test_sentiment_word_beats_substring() {
        // "POSITIVE," carries punctuation, so NEGATIVE is the only whole word
        assert_eq!(Sentiment::parse_response("POSITIVE, NEGATIVE"), Sentiment::Negative);
        assert_eq!(Sentiment::parse_response("nonneutral NEGATIVE"), Sentiment::Negative);
    }

    #[test]
    fn test_sentiment_punctuated_word_falls_back_to_substring() {
        assert_eq!(Sentiment::parse_response("Sentiment: Neutral."), Sentiment::Neutral);
        assert_eq!(Sentiment::parse_response("NEGATIVE."), Sentiment::Negative);
    }

    #[test]
    fn test_sentiment_substring_fallback() {
        assert_eq!(Sentiment::parse_response("VERYPOSITIVE"), Sentiment::Positive);
    }

    #[test]
    fn test_sentiment_unknown() {
        assert_eq!(Sentiment::parse_response("bullish"), Sentiment::Unknown);
        assert_eq!(Sentiment::parse_response(""), Sentiment::Unknown);
        assert!(!Sentiment::Unknown.is_definite());
        assert!(Sentiment::Neutral.is_definite());
    }

    #[test]
    fn test_sentiment_serialization() {
        assert_eq!(serde_json::to_string(&Sentiment::Positive).unwrap(), "\"POSITIVE\"");
        assert_eq!(Sentiment::Negative.to_string(), "NEGATIVE");
    }
}
