use crate::models::Platform;
use crate::remote::{JobApi, Orchestrator};
use crate::scrapers::traits::ScraperTrait;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

/// Collector backed by a remote scrape job instead of a local browser
pub struct RemoteJobScraper<A: JobApi> {
    platform: Platform,
    orchestrator: Orchestrator<A>,
    squid_id: String,
    search_url: Option<String>,
    max_results: Option<usize>,
}

impl<A: JobApi> RemoteJobScraper<A> {
    pub fn new(platform: Platform, orchestrator: Orchestrator<A>, squid_id: impl Into<String>) -> Self {
        Self {
            platform,
            orchestrator,
            squid_id: squid_id.into(),
            search_url: None,
            max_results: None,
        }
    }

    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = Some(url.into());
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }
}

#[async_trait]
impl<A: JobApi> ScraperTrait for RemoteJobScraper<A> {
    async fn collect(&self) -> Result<Vec<Value>> {
        info!("Collecting {} via remote job on squid {}", self.platform, self.squid_id);

        let results = self
            .orchestrator
            .run(&self.squid_id, self.search_url.as_deref(), self.max_results)
            .await
            .with_context(|| format!("Remote scrape for {} failed", self.platform))?;

        // Vendor rows carry no platform tag; stamp it so ids fingerprint per source
        let platform = self.platform.as_str();
        Ok(results
            .into_iter()
            .map(|mut row| {
                if let Some(obj) = row.as_object_mut() {
                    obj.entry("source").or_insert_with(|| Value::from(platform));
                }
                row
            })
            .collect())
    }

    fn source_name(&self) -> &'static str {
        self.platform.as_str()
    }
}
