//! LLM-backed classifier and insight generator
//!
//! Supports multiple LLM providers: Gemini, DeepSeek, Anthropic, OpenAI, and OpenAI-compatible APIs.

use super::{InsightContext, InsightGenerator, SentimentClassifier};
use crate::config::LlmConfig;
use crate::error::{MonitorError, Result};
use crate::types::Sentiment;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Chat-completion client shared by both capabilities
pub struct LlmClient {
    http: Client,
    provider: LlmProvider,
}

#[derive(Debug, Clone)]
pub enum LlmProvider {
    Gemini {
        api_key: String,
        model: String,
    },
    DeepSeek {
        api_key: String,
        model: String,
    },
    Anthropic {
        api_key: String,
        model: String,
    },
    OpenAI {
        api_key: String,
        model: String,
        base_url: String,
    },
    /// OpenAI-compatible API (Ollama, vLLM, etc.)
    Compatible {
        api_key: Option<String>,
        model: String,
        base_url: String,
    },
}

// ============ Request/Response types ============

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

/// A system instruction plus the user turn
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const SENTIMENT_SYSTEM: &str = "Analyze the sentiment of the following financial news headline \
regarding its likely impact on the company's stock price. \
Respond with only one word: POSITIVE, NEGATIVE, or NEUTRAL.";

/// Build the headline classification prompt
pub fn sentiment_prompt(headline: &str) -> Prompt {
    Prompt {
        system: SENTIMENT_SYSTEM.to_string(),
        user: format!("Headline: '{}'\nSentiment:", headline),
    }
}

/// Build the alert insight prompt
pub fn insight_prompt(ctx: &InsightContext) -> Prompt {
    Prompt {
        system: format!(
            "You are a financial analyst assistant providing concise alerts for {} stock. \
Based *only* on the provided information, generate a brief (1-2 sentence) insight explaining \
the potential significance. Mention the price change percentage and the overall recent news sentiment.",
            ctx.ticker
        ),
        user: format!(
            "Stock: {}\n\
            Current Price: ${:.2}\n\
            Previous Price: ${:.2}\n\
            Price Change: {:.2}%\n\
            Recent News Sentiment (Last {} articles): {}\n\n\
            **Insight:**",
            ctx.ticker,
            ctx.current_price,
            ctx.previous_price,
            ctx.change_percent,
            ctx.news_count,
            ctx.sentiment_summary,
        ),
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

impl LlmClient {
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            http: Client::new(),
            provider,
        }
    }

    /// Create from config; the HTTP client carries the configured timeout as a backstop
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider = match config.provider.to_lowercase().as_str() {
            "gemini" | "google" => LlmProvider::Gemini {
                api_key: config.api_key.clone(),
                model: config.model.clone().unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            },
            "deepseek" => LlmProvider::DeepSeek {
                api_key: config.api_key.clone(),
                model: config.model.clone().unwrap_or_else(|| "deepseek-chat".to_string()),
            },
            "anthropic" | "claude" => LlmProvider::Anthropic {
                api_key: config.api_key.clone(),
                model: config.model.clone().unwrap_or_else(|| "claude-sonnet-4-20250514".to_string()),
            },
            "openai" | "gpt" => LlmProvider::OpenAI {
                api_key: config.api_key.clone(),
                model: config.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string()),
                base_url: config.base_url.clone().unwrap_or_else(|| "https://api.openai.com".to_string()),
            },
            "ollama" => LlmProvider::Compatible {
                api_key: None,
                model: config.model.clone().unwrap_or_else(|| "qwen2.5:14b".to_string()),
                base_url: config.base_url.clone().unwrap_or_else(|| "http://localhost:11434".to_string()),
            },
            "compatible" | "custom" => LlmProvider::Compatible {
                api_key: if config.api_key.is_empty() { None } else { Some(config.api_key.clone()) },
                model: config.model.clone().ok_or_else(|| MonitorError::Config("model required for compatible provider".into()))?,
                base_url: config.base_url.clone().ok_or_else(|| MonitorError::Config("base_url required for compatible provider".into()))?,
            },
            _ => return Err(MonitorError::Config(format!("Unknown LLM provider: {}", config.provider))),
        };

        let needs_key = !matches!(provider, LlmProvider::Compatible { .. });
        if needs_key && config.api_key.is_empty() {
            return Err(MonitorError::Config(format!(
                "api_key required for provider {}",
                config.provider
            )));
        }

        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { http, provider })
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    async fn call_openai_compatible(
        &self,
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        prompt: &Prompt,
    ) -> Result<String> {
        let request = OpenAIRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
        };

        let mut req = self
            .http
            .post(format!("{}/v1/chat/completions", base_url))
            .header("content-type", "application/json");

        if let Some(key) = api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let text = Self::read_body(req.json(&request).send().await?).await?;
        let response: OpenAIResponse = serde_json::from_str(&text).map_err(|e| {
            MonitorError::Api(format!("JSON parse error: {} - response: {}", e, preview(&text, 200)))
        })?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| MonitorError::Api("Empty response from LLM".into()))
    }

    async fn call_anthropic(&self, api_key: &str, model: &str, prompt: &Prompt) -> Result<String> {
        let request = AnthropicRequest {
            model: model.to_string(),
            max_tokens: 300,
            system: prompt.system.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.user.clone(),
            }],
        };

        let resp = self
            .http
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let response: AnthropicResponse = serde_json::from_str(&Self::read_body(resp).await?)?;
        response
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| MonitorError::Api("Empty response from Anthropic".into()))
    }

    async fn call_gemini(&self, api_key: &str, model: &str, prompt: &Prompt) -> Result<String> {
        let request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: prompt.system.clone(),
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: prompt.user.clone(),
                }],
            }],
        };

        let resp = self
            .http
            .post(format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                model
            ))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let response: GeminiResponse = serde_json::from_str(&Self::read_body(resp).await?)?;
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| MonitorError::Api("Empty response from Gemini".into()))
    }

    async fn read_body(resp: reqwest::Response) -> Result<String> {
        let status = resp.status();
        let text = resp.text().await?;
        tracing::debug!("LLM raw response: {}", preview(&text, 500));

        if !status.is_success() {
            return Err(MonitorError::Api(format!("HTTP {}: {}", status, preview(&text, 200))));
        }
        Ok(text)
    }

    /// Send one prompt to the configured provider and return the raw completion
    pub async fn complete(&self, prompt: &Prompt) -> Result<String> {
        match &self.provider {
            LlmProvider::Gemini { api_key, model } => self.call_gemini(api_key, model, prompt).await,
            LlmProvider::DeepSeek { api_key, model } => {
                self.call_openai_compatible("https://api.deepseek.com", Some(api_key), model, prompt)
                    .await
            }
            LlmProvider::Anthropic { api_key, model } => {
                self.call_anthropic(api_key, model, prompt).await
            }
            LlmProvider::OpenAI { api_key, model, base_url } => {
                self.call_openai_compatible(base_url, Some(api_key), model, prompt)
                    .await
            }
            LlmProvider::Compatible { api_key, model, base_url } => {
                self.call_openai_compatible(base_url, api_key.as_deref(), model, prompt)
                    .await
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        match &self.provider {
            LlmProvider::Gemini { .. } => "Gemini",
            LlmProvider::DeepSeek { .. } => "DeepSeek",
            LlmProvider::Anthropic { .. } => "Claude",
            LlmProvider::OpenAI { .. } => "GPT",
            LlmProvider::Compatible { .. } => "Compatible",
        }
    }
}

#[async_trait]
impl SentimentClassifier for LlmClient {
    fn name(&self) -> &'static str {
        self.provider_name()
    }

    async fn classify(&self, headline: &str) -> Result<Sentiment> {
        let raw = self
            .complete(&sentiment_prompt(headline))
            .await
            .map_err(|e| MonitorError::Classification(e.to_string()))?;

        let sentiment = Sentiment::parse_response(&raw);
        if sentiment == Sentiment::Unknown {
            tracing::warn!("Unexpected sentiment format: '{}'", preview(&raw, 100));
        }
        Ok(sentiment)
    }
}

#[async_trait]
impl InsightGenerator for LlmClient {
    fn name(&self) -> &'static str {
        self.provider_name()
    }

    async fn generate(&self, context: &InsightContext) -> Result<String> {
        let raw = self
            .complete(&insight_prompt(context))
            .await
            .map_err(|e| MonitorError::Generation(e.to_string()))?;

        let insight = raw.trim();
        if insight.is_empty() {
            return Err(MonitorError::Generation("empty insight".into()));
        }
        Ok(insight.to_string())
    }
}
