use crate::clock::{Clock, SystemClock};
use crate::dedup::{dedupe, FingerprintConfig};
use crate::discovery::{CacheRepository, DiscoveryCache};
use crate::models::{BatchOutput, ScoredListing};
use crate::normalize::normalize_batch;
use crate::scoring::score;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Only return listings not seen in earlier runs
    pub only_new: bool,
}

/// Raw records in, scored unique listings out
pub struct Pipeline<R: CacheRepository> {
    cache: DiscoveryCache<R>,
    fingerprint: FingerprintConfig,
    clock: Arc<dyn Clock>,
}

impl<R: CacheRepository> Pipeline<R> {
    pub fn new(repo: R, fingerprint: FingerprintConfig) -> Self {
        Self::with_clock(repo, fingerprint, Arc::new(SystemClock))
    }

    pub fn with_clock(repo: R, fingerprint: FingerprintConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: DiscoveryCache::with_clock(repo, clock.clone()),
            fingerprint,
            clock,
        }
    }

    pub async fn run(&self, platform: &str, raws: &[Value], options: PipelineOptions) -> BatchOutput {
        let listings = normalize_batch(raws, self.clock.now());
        info!(platform, raw = raws.len(), "Normalized records");

        let deduped = dedupe(listings, &self.fingerprint);
        let duplicates_removed = deduped.duplicates.len();
        info!(platform, unique = deduped.unique.len(), duplicates_removed, "Deduplicated batch");

        let discovery = self.cache.update(platform, &deduped.unique).await;

        let items: Vec<ScoredListing> = deduped
            .unique
            .into_iter()
            .zip(discovery.is_new)
            .filter(|(_, is_new)| *is_new || !options.only_new)
            .map(|(item, is_new)| {
                let result = score(&item.listing);
                ScoredListing {
                    listing: item.listing,
                    fingerprint: item.fingerprint,
                    is_new,
                    private_score: result.score,
                    score_reasons: result.reasons,
                }
            })
            .collect();

        info!(platform, returned = items.len(), new = discovery.total_new, "Pipeline finished");

        BatchOutput {
            platform: platform.to_string(),
            total_results: items.len(),
            duplicates_removed,
            new_count: discovery.total_new,
            items,
        }
    }
}
