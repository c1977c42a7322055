pub mod fingerprint;

pub use fingerprint::{fingerprint, FingerprintConfig};

use crate::models::Listing;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// A listing carrying its transient fingerprint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fingerprinted {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(rename = "_fingerprint")]
    pub fingerprint: String,
}

/// Outcome of one deduplication pass
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub unique: Vec<Fingerprinted>,
    pub duplicates: Vec<Fingerprinted>,
}

/// Split a batch into first occurrences and repeats, keeping input order.
///
/// Only fingerprints seen within this call count; nothing is persisted.
pub fn dedupe(listings: Vec<Listing>, config: &FingerprintConfig) -> DedupOutcome {
    let mut seen = HashSet::new();
    let mut outcome = DedupOutcome::default();

    for listing in listings {
        let fp = fingerprint(&listing, config);
        let item = Fingerprinted {
            listing,
            fingerprint: fp.clone(),
        };
        if seen.insert(fp) {
            outcome.unique.push(item);
        } else {
            debug!(fingerprint = %item.fingerprint, url = %item.listing.url, "Duplicate listing");
            outcome.duplicates.push(item);
        }
    }

    outcome
}
