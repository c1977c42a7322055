use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::RawBatch;
use crate::models::Platform;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

/// Reads the JSON dump an external browser collector left on disk
pub struct FileScraper {
    platform: Platform,
    path: PathBuf,
}

impl FileScraper {
    pub fn new(platform: Platform, path: impl Into<PathBuf>) -> Self {
        Self {
            platform,
            path: path.into(),
        }
    }
}

#[async_trait]
impl ScraperTrait for FileScraper {
    async fn collect(&self) -> Result<Vec<Value>> {
        debug!("Reading collector output from {}", self.path.display());

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Collector output in {} is not JSON", self.path.display()))?;

        let batch = RawBatch::from_value(value);
        info!("Loaded {} raw {} records", batch.len(), self.platform);
        Ok(batch.records)
    }

    fn source_name(&self) -> &'static str {
        self.platform.as_str()
    }
}
