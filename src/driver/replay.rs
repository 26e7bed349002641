//! Replay source over a JSON-lines file of swap events

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::SwapSource;
use crate::types::SwapEvent;

/// Reads one JSON `SwapEvent` per line; blank lines are ignored.
/// The file is re-read every fetch so appended events show up on the next round.
pub struct JsonlSwapSource {
    path: PathBuf,
}

impl JsonlSwapSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(&self, content: &str) -> Result<Vec<SwapEvent>> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str::<SwapEvent>(line).with_context(|| {
                    format!(
                        "Invalid swap event on line {} of {}",
                        index + 1,
                        self.path.display()
                    )
                })
            })
            .collect()
    }
}

#[async_trait]
impl SwapSource for JsonlSwapSource {
    fn name(&self) -> &'static str {
        "jsonl-replay"
    }

    async fn fetch_swaps(&mut self, from_block: u64) -> Result<Vec<SwapEvent>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read replay file {}", self.path.display()))?;

        let mut events = self.parse(&content)?;
        events.retain(|e| e.block_number >= from_block);
        debug!(
            path = %self.path.display(),
            from_block,
            events = events.len(),
            "Loaded replay events"
        );
        Ok(events)
    }
}
