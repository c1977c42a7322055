//! Real-estate classifieds ingestion: normalization, deduplication,
//! cross-run novelty tracking and private-seller scoring.

pub mod clock;
pub mod config;
pub mod dedup;
pub mod discovery;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod remote;
pub mod scoring;
pub mod scrapers;

pub use models::{BatchOutput, Listing, Platform, ScoreResult, ScoredListing};
pub use pipeline::{Pipeline, PipelineOptions};
