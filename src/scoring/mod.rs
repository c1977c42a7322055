//! Private-seller (FSBO) likelihood scoring.
//!
//! Starts from a neutral 50 and folds the ordered rule table over the
//! listing. Deterministic for a given listing and its upstream signals.

pub mod rules;

pub use rules::{Adjustment, Rule, RULES};

use crate::models::{Listing, ScoreResult};
use tracing::{debug, trace};

const BASE_SCORE: i32 = 50;

pub fn score(listing: &Listing) -> ScoreResult {
    score_with(listing, RULES)
}

/// Score against a custom rule table
pub fn score_with(listing: &Listing, rules: &[Rule]) -> ScoreResult {
    let (total, mut reasons) = rules.iter().fold(
        (BASE_SCORE, Vec::new()),
        |(total, mut reasons), rule| match (rule.evaluate)(listing) {
            Some(adj) => {
                trace!(rule = rule.name, delta = adj.delta, "Rule applied");
                reasons.push(format!("{} ({:+})", adj.reason, adj.delta));
                (total + adj.delta, reasons)
            }
            None => (total, reasons),
        },
    );

    if reasons.is_empty() {
        reasons.push("base score calculated".to_string());
    }

    let score = total.clamp(0, 100) as u8;
    debug!(ad_id = %listing.ad_id, score, raw = total, "Scored listing");

    ScoreResult { score, reasons }
}
