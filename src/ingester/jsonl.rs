//! Newline-delimited JSON source
//!
//! Each line is one tagged event:
//! `{"kind":"price","ticker":"NVDA","price":125.5,"timestamp":"..."}` or
//! `{"kind":"news","headline":"...","source":"Reuters"}`.
//! Lines that fail to decode are skipped with a warning.

use super::EventSource;
use crate::error::Result;
use crate::types::InboundEvent;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Where lines are read from
#[derive(Debug, Clone)]
pub enum JsonlInput {
    Stdin,
    File(PathBuf),
}

impl JsonlInput {
    /// `-` means stdin
    pub fn parse(input: &str) -> Self {
        if input == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(shellexpand::tilde(input).as_ref()))
        }
    }
}

pub struct JsonlSource {
    name: String,
    input: JsonlInput,
}

impl JsonlSource {
    pub fn new(input: JsonlInput) -> Self {
        let name = match &input {
            JsonlInput::Stdin => "stdin".to_string(),
            JsonlInput::File(path) => path.display().to_string(),
        };
        Self { name, input }
    }

    /// Decode one line; blank lines and `#` comments yield `None`
    pub fn decode_line(line: &str) -> Option<Result<InboundEvent>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        Some(serde_json::from_str(trimmed).map_err(Into::into))
    }

    /// Forward decoded events from any buffered reader; returns the number forwarded
    pub async fn pump<R>(&self, reader: R, tx: &mpsc::Sender<InboundEvent>) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut line_no = 0usize;
        let mut forwarded = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            match Self::decode_line(&line) {
                None => continue,
                Some(Ok(event)) => {
                    if tx.send(event).await.is_err() {
                        tracing::debug!(source = %self.name, "Receiver closed, stopping");
                        break;
                    }
                    forwarded += 1;
                }
                Some(Err(e)) => {
                    tracing::warn!(source = %self.name, line = line_no, "Skipping undecodable event: {}", e);
                }
            }
        }

        Ok(forwarded)
    }
}

#[async_trait]
impl EventSource for JsonlSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, tx: mpsc::Sender<InboundEvent>) -> Result<()> {
        tracing::info!("JSONL source {} starting", self.name);

        let forwarded = match &self.input {
            JsonlInput::Stdin => self.pump(BufReader::new(tokio::io::stdin()), &tx).await?,
            JsonlInput::File(path) => {
                let file = tokio::fs::File::open(path).await?;
                self.pump(BufReader::new(file), &tx).await?
            }
        };

        tracing::info!("JSONL source {} finished after {} events", self.name, forwarded);
        Ok(())
    }
}
