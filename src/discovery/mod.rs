//! Cross-run novelty tracking.
//!
//! Each platform keeps a map of external ad ids it has already reported.
//! A run classifies every listing as new or seen, then rewrites the whole
//! map. Storage problems never fail a run: a store that cannot be read is
//! treated as empty and a failed write is logged, so the worst outcome is
//! reporting an already-seen ad as new again on the next run.
//!
//! Read-modify-write is serialised per platform within one process. Separate
//! processes writing the same platform are last-writer-wins.

pub mod store;

pub use store::{CacheEntry, CacheRepository, DiscoveryState, JsonFileRepository, MemoryRepository};

use crate::clock::{Clock, SystemClock};
use crate::dedup::Fingerprinted;
use crate::models::Listing;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

impl AsRef<Listing> for Listing {
    fn as_ref(&self) -> &Listing {
        self
    }
}

impl AsRef<Listing> for Fingerprinted {
    fn as_ref(&self) -> &Listing {
        &self.listing
    }
}

/// Result of committing a batch to the cache
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome<T> {
    pub new_items: Vec<T>,
    pub total_new: usize,
    /// One flag per input item, in input order
    pub is_new: Vec<bool>,
}

pub struct DiscoveryCache<R: CacheRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<R: CacheRepository> DiscoveryCache<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, Arc::new(SystemClock))
    }

    pub fn with_clock(repo: R, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn platform_lock(&self, platform: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(platform.to_string()).or_default().clone()
    }

    async fn load_or_empty(&self, platform: &str) -> DiscoveryState {
        match self.repo.load(platform).await {
            Ok(state) => state,
            Err(e) => {
                warn!(platform, error = %e, "Discovery cache unreadable, starting empty");
                DiscoveryState::default()
            }
        }
    }

    async fn save_or_log(&self, platform: &str, state: &DiscoveryState) {
        if let Err(e) = self.repo.save(platform, state).await {
            warn!(platform, error = %e, "Failed to save discovery cache, ids will be re-reported next run");
        }
    }

    /// Classify each listing as new or already seen, and record the sighting.
    ///
    /// Listings without an external id are skipped and never count as new.
    pub async fn update<T>(&self, platform: &str, items: &[T]) -> DiscoveryOutcome<T>
    where
        T: AsRef<Listing> + Clone,
    {
        let lock = self.platform_lock(platform);
        let _guard = lock.lock().await;

        let mut state = self.load_or_empty(platform).await;
        let now = self.clock.now();
        let mut new_items = Vec::new();
        let mut is_new = Vec::with_capacity(items.len());
        let mut skipped = 0usize;

        for item in items {
            let listing = item.as_ref();
            if listing.ad_id.is_empty() {
                skipped += 1;
                debug!(platform, url = %listing.url, "Listing has no ad id, skipping discovery");
                is_new.push(false);
                continue;
            }

            match state.ads.get_mut(&listing.ad_id) {
                Some(entry) => {
                    if now > entry.last_seen {
                        entry.last_seen = now;
                    }
                    is_new.push(false);
                }
                None => {
                    state.ads.insert(
                        listing.ad_id.clone(),
                        CacheEntry {
                            url: listing.url.clone(),
                            first_seen: now,
                            last_seen: now,
                        },
                    );
                    new_items.push(item.clone());
                    is_new.push(true);
                }
            }
        }

        if skipped > 0 {
            warn!(platform, skipped, "Listings without ad id were not tracked");
        }

        state.last_run = Some(now);
        self.save_or_log(platform, &state).await;

        let total_new = new_items.len();
        info!(platform, total_new, tracked = state.ads.len(), "Discovery cache updated");

        DiscoveryOutcome {
            new_items,
            total_new,
            is_new,
        }
    }

    /// Listings whose id is not in the cache yet. Read-only: call
    /// [`update`](Self::update) to commit the sighting.
    pub async fn filter_new<T>(&self, platform: &str, items: &[T]) -> Vec<T>
    where
        T: AsRef<Listing> + Clone,
    {
        let state = self.load_or_empty(platform).await;
        items
            .iter()
            .filter(|item| {
                let id = &item.as_ref().ad_id;
                !id.is_empty() && !state.ads.contains_key(id)
            })
            .cloned()
            .collect()
    }

    /// Drop entries not seen in the last `days_to_keep` days. Returns how
    /// many were removed.
    pub async fn clean_old_cache(&self, platform: &str, days_to_keep: u32) -> usize {
        let lock = self.platform_lock(platform);
        let _guard = lock.lock().await;

        let mut state = self.load_or_empty(platform).await;
        let cutoff = self.clock.now() - chrono::Duration::days(i64::from(days_to_keep));
        let before = state.ads.len();
        state.ads.retain(|_, entry| entry.last_seen >= cutoff);
        let removed = before - state.ads.len();

        if removed > 0 {
            self.save_or_log(platform, &state).await;
        }
        info!(platform, removed, kept = state.ads.len(), "Cleaned discovery cache");
        removed
    }
}
