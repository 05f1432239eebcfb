//! Unit tests for ingester module

#[cfg(test)]
mod tests {
    use super::super::jsonl::JsonlInput;
    use super::super::*;
    use crate::types::{NewsEvent, PriceEvent};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    struct VecSource {
        name: String,
        events: Vec<InboundEvent>,
    }

    #[async_trait]
    impl EventSource for VecSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, tx: mpsc::Sender<InboundEvent>) -> Result<()> {
            for event in &self.events {
                if tx.send(event.clone()).await.is_err() {
                    break;
                }
            }
            Ok(())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl EventSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(&self, _tx: mpsc::Sender<InboundEvent>) -> Result<()> {
            Err(crate::error::MonitorError::Api("feed offline".into()))
        }
    }

    #[test]
    fn test_decode_line_skips_blank_and_comments() {
        assert!(JsonlSource::decode_line("").is_none());
        assert!(JsonlSource::decode_line("   ").is_none());
        assert!(JsonlSource::decode_line("# replay of 2024-05-01").is_none());
    }

    #[test]
    fn test_decode_line_price() {
        let decoded = JsonlSource::decode_line(r#"{"kind":"price","ticker":"NVDA","price":"125.50"}"#)
            .unwrap()
            .unwrap();
        match decoded {
            InboundEvent::Price(p) => assert_eq!(p.price, dec!(125.50)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_line_rejects_unknown_kind() {
        let decoded = JsonlSource::decode_line(r#"{"kind":"trade","ticker":"NVDA"}"#).unwrap();
        assert!(decoded.is_err());
    }

    #[test]
    fn test_input_parse() {
        assert!(matches!(JsonlInput::parse("-"), JsonlInput::Stdin));
        assert!(matches!(JsonlInput::parse("events.jsonl"), JsonlInput::File(_)));
    }

    #[tokio::test]
    async fn test_pump_forwards_valid_lines() {
        let input = concat!(
            "{\"kind\":\"price\",\"ticker\":\"NVDA\",\"price\":100}\n",
            "not json\n",
            "\n",
            "{\"kind\":\"news\",\"headline\":\"NVIDIA announces new chip\",\"source\":\"Reuters\"}\n",
        );
        let source = JsonlSource::new(JsonlInput::Stdin);
        let (tx, mut rx) = mpsc::channel(8);

        let forwarded = source.pump(input.as_bytes(), &tx).await.unwrap();
        assert_eq!(forwarded, 2);
        assert_eq!(rx.recv().await.unwrap().kind(), "price");
        assert_eq!(rx.recv().await.unwrap().kind(), "news");
    }

    #[tokio::test]
    async fn test_aggregator_merges_sources() {
        let mut agg = SourceAggregator::new();
        agg.add_source(Arc::new(VecSource {
            name: "prices".into(),
            events: vec![
                InboundEvent::Price(PriceEvent::new("NVDA", dec!(100))),
                InboundEvent::Price(PriceEvent::new("NVDA", dec!(101))),
            ],
        }));
        agg.add_source(Arc::new(VecSource {
            name: "news".into(),
            events: vec![InboundEvent::News(NewsEvent::new("Chip demand surges", "Bloomberg"))],
        }));
        agg.add_source(Arc::new(FailingSource));
        assert_eq!(agg.len(), 3);

        let (tx, mut rx) = mpsc::channel(16);
        agg.run(tx).await.unwrap();

        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event);
        }
        assert_eq!(received.len(), 3);
        assert_eq!(received.iter().filter(|e| e.kind() == "price").count(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_reports_error() {
        let source = JsonlSource::new(JsonlInput::File("/nonexistent/events.jsonl".into()));
        let (tx, _rx) = mpsc::channel(1);
        assert!(source.run(tx).await.is_err());
    }
}
