//! Event ingestion
//!
//! Sources push decoded [`InboundEvent`]s into a shared channel:
//! - JSON lines from a file or stdin (`jsonl`)
//! - any number of sources run side by side (`source`)

pub mod jsonl;
pub mod source;

#[cfg(test)]
mod tests;

pub use jsonl::JsonlSource;
pub use source::SourceAggregator;

use crate::error::Result;
use crate::types::InboundEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Event source trait
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Source name
    fn name(&self) -> &str;

    /// Produce events into the channel until exhausted or the receiver is gone
    async fn run(&self, tx: mpsc::Sender<InboundEvent>) -> Result<()>;
}
