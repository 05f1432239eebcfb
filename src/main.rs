//! Ticker Watch
//!
//! Price/news correlation monitor.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::sync::Arc;
use ticker_watch::{
    config::Config,
    ingester::{jsonl::JsonlInput, JsonlSource, SourceAggregator},
    model::{InsightContext, InsightGenerator, LlmClient, SentimentClassifier, UnavailableLlm},
    monitor::Monitor,
    notify::Notifier,
    trigger::percent_change,
};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "ticker-watch")]
#[command(about = "Correlates price moves with news sentiment and raises alerts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume price and news events and raise alerts
    Run {
        /// JSON-lines event input ("-" for stdin); repeat to merge several feeds
        #[arg(short, long, default_value = "-")]
        input: Vec<String>,
    },
    /// Classify a single headline
    Classify {
        headline: String,
    },
    /// Generate an insight for a hypothetical price move
    Insight {
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        current: Decimal,
        #[arg(long)]
        previous: Decimal,
        /// Comma-joined sentiment labels, newest first
        #[arg(long, default_value = "No recent news")]
        sentiment: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::resolve(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run { input } => run_monitor(config, input).await,
        Commands::Classify { headline } => classify(config, &headline).await,
        Commands::Insight {
            ticker,
            current,
            previous,
            sentiment,
        } => insight(config, ticker, current, previous, sentiment).await,
    }
}

type LlmAdapters = (Arc<dyn SentimentClassifier>, Arc<dyn InsightGenerator>);

/// Build the LLM adapters, falling back to a disabled stand-in
fn build_llm(config: &Config) -> LlmAdapters {
    let Some(llm_config) = &config.llm else {
        tracing::warn!("No [llm] section configured. Sentiment/Insight features disabled.");
        return disabled_llm();
    };

    match LlmClient::from_config(llm_config) {
        Ok(client) => {
            tracing::info!("✅ {} model initialized.", SentimentClassifier::name(&client));
            let client = Arc::new(client);
            let classifier: Arc<dyn SentimentClassifier> = client.clone();
            let generator: Arc<dyn InsightGenerator> = client;
            (classifier, generator)
        }
        Err(e) => {
            tracing::error!("🚨 Error initializing LLM client: {}", e);
            tracing::warn!("Sentiment analysis and proactive insights will be disabled.");
            disabled_llm()
        }
    }
}

fn disabled_llm() -> LlmAdapters {
    (Arc::new(UnavailableLlm), Arc::new(UnavailableLlm))
}

fn call_timeout(config: &Config) -> std::time::Duration {
    config
        .llm
        .as_ref()
        .map(|l| l.timeout())
        .unwrap_or(std::time::Duration::from_secs(30))
}

async fn run_monitor(config: Config, inputs: Vec<String>) -> anyhow::Result<()> {
    tracing::info!("✅ Monitor Agent starting...");

    let (classifier, generator) = build_llm(&config);
    let notifier = Arc::new(Notifier::from_config(config.telegram.as_ref()));
    let monitor = Arc::new(Monitor::new(
        &config.monitor,
        classifier,
        generator,
        notifier.clone(),
        call_timeout(&config),
    ));

    if let Err(e) = notifier.startup(&config.monitor.news_ticker).await {
        tracing::warn!("Startup notification failed: {}", e);
    }

    let mut sources = SourceAggregator::new();
    for input in &inputs {
        sources.add_source(Arc::new(JsonlSource::new(JsonlInput::parse(input))));
    }

    let (tx, rx) = mpsc::channel(1024);
    let dispatcher = tokio::spawn(Arc::clone(&monitor).run(rx));

    let reason = tokio::select! {
        result = sources.run(tx) => {
            result?;
            // Inputs exhausted; let in-flight events finish
            dispatcher.await?;
            "inputs exhausted"
        }
        _ = tokio::signal::ctrl_c() => "interrupted",
    };

    tracing::info!("🛑 Monitor Agent shutting down ({})...", reason);
    monitor.log_stats();
    if let Err(e) = notifier.shutdown(reason).await {
        tracing::warn!("Shutdown notification failed: {}", e);
    }

    Ok(())
}

async fn classify(config: Config, headline: &str) -> anyhow::Result<()> {
    let (classifier, _) = build_llm(&config);
    let sentiment = ticker_watch::model::bounded(
        "sentiment classification",
        call_timeout(&config),
        classifier.classify(headline),
    )
    .await?;

    println!("{}", sentiment);
    Ok(())
}

async fn insight(
    config: Config,
    ticker: String,
    current: Decimal,
    previous: Decimal,
    sentiment_summary: String,
) -> anyhow::Result<()> {
    let news_count = if sentiment_summary == "No recent news" {
        0
    } else {
        sentiment_summary.split(',').filter(|s| !s.trim().is_empty()).count()
    };

    let context = InsightContext {
        ticker,
        current_price: current,
        previous_price: previous,
        change_percent: percent_change(previous, current)?,
        sentiment_summary,
        news_count,
    };

    let (_, generator) = build_llm(&config);
    let text = ticker_watch::model::bounded(
        "insight generation",
        call_timeout(&config),
        generator.generate(&context),
    )
    .await?;

    println!("\n💡 {} ({:+.2}%)\n\n{}", context.ticker, context.change_percent, text);
    Ok(())
}
