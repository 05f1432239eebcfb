//! Tests for model adapters

#[cfg(test)]
mod tests {
    use super::super::llm::{insight_prompt, sentiment_prompt};
    use super::super::*;
    use crate::config::LlmConfig;
    use rust_decimal_macros::dec;

    fn context() -> InsightContext {
        InsightContext {
            ticker: "NVDA".to_string(),
            current_price: dec!(105.00),
            previous_price: dec!(100.00),
            change_percent: dec!(5),
            sentiment_summary: "POSITIVE, NEUTRAL".to_string(),
            news_count: 2,
        }
    }

    fn llm_config(provider: &str, api_key: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            api_key: api_key.to_string(),
            model: None,
            base_url: None,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_sentiment_prompt_contains_headline() {
        let prompt = sentiment_prompt("NVIDIA beats earnings");
        assert!(prompt.user.contains("'NVIDIA beats earnings'"));
        assert!(prompt.system.contains("POSITIVE, NEGATIVE, or NEUTRAL"));
    }

    #[test]
    fn test_insight_prompt_formats_prices() {
        let prompt = insight_prompt(&context());
        assert!(prompt.system.contains("NVDA stock"));
        assert!(prompt.user.contains("Current Price: $105.00"));
        assert!(prompt.user.contains("Previous Price: $100.00"));
        assert!(prompt.user.contains("Price Change: 5.00%"));
        assert!(prompt.user.contains("(Last 2 articles): POSITIVE, NEUTRAL"));
    }

    #[test]
    fn test_from_config_gemini_default_model() {
        let client = LlmClient::from_config(&llm_config("gemini", "key")).unwrap();
        match client.provider() {
            LlmProvider::Gemini { model, .. } => assert_eq!(model, "gemini-1.5-flash"),
            other => panic!("unexpected provider {:?}", other),
        }
        assert_eq!(SentimentClassifier::name(&client), "Gemini");
    }

    #[test]
    fn test_from_config_unknown_provider() {
        let err = LlmClient::from_config(&llm_config("mystery", "key")).err().unwrap();
        assert!(err.to_string().contains("Unknown LLM provider"));
    }

    #[test]
    fn test_from_config_requires_key() {
        assert!(LlmClient::from_config(&llm_config("anthropic", "")).is_err());
        // Local endpoints run without a key
        assert!(LlmClient::from_config(&llm_config("ollama", "")).is_ok());
    }

    #[test]
    fn test_from_config_compatible_requires_base_url() {
        let mut cfg = llm_config("compatible", "");
        cfg.model = Some("llama3".to_string());
        assert!(LlmClient::from_config(&cfg).is_err());
        cfg.base_url = Some("http://localhost:8000".to_string());
        assert!(LlmClient::from_config(&cfg).is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_llm_fails_both_capabilities() {
        let llm = UnavailableLlm;
        let classified = llm.classify("anything").await;
        assert!(matches!(classified, Err(MonitorError::Classification(_))));
        let generated = llm.generate(&context()).await;
        assert!(matches!(generated, Err(MonitorError::Generation(_))));
    }

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let out = bounded("noop", Duration::from_secs(1), async { Ok::<_, MonitorError>(7) }).await;
        assert_eq!(out.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let out: Result<()> = bounded("slow call", Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        match out {
            Err(MonitorError::Timeout { operation, .. }) => {
                assert_eq!(operation, "slow call");
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mock_classifier() {
        let mut mock = MockSentimentClassifier::new();
        mock.expect_classify()
            .withf(|headline: &str| headline.contains("record"))
            .returning(|_| Ok(Sentiment::Positive));

        let sentiment = mock.classify("record quarterly revenue").await.unwrap();
        assert_eq!(sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_mock_generator_blocking() {
        let mut mock = MockInsightGenerator::new();
        mock.expect_generate()
            .withf(|ctx: &InsightContext| ctx.news_count == 2)
            .returning(|_| Ok("Up 5% on upbeat coverage.".to_string()));

        let insight = tokio_test::block_on(mock.generate(&context())).unwrap();
        assert_eq!(insight, "Up 5% on upbeat coverage.");
    }
}
