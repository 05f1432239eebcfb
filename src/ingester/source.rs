//! Multi-source runner

use super::EventSource;
use crate::error::Result;
use crate::types::InboundEvent;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs several event sources concurrently into one channel
#[derive(Default)]
pub struct SourceAggregator {
    sources: Vec<Arc<dyn EventSource>>,
}

impl SourceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, source: Arc<dyn EventSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Run all sources concurrently; returns once every source has finished
    pub async fn run(&self, tx: mpsc::Sender<InboundEvent>) -> Result<()> {
        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = source.run(tx).await {
                        tracing::error!("Source {} error: {}", source.name(), e);
                    }
                })
            })
            .collect();
        drop(tx);

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                tracing::error!("Source task panicked: {}", e);
            }
        }

        Ok(())
    }
}
