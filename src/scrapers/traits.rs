use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Common trait for all listing collectors
/// Collectors hand back raw, loosely-typed records; normalization happens downstream
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Collect raw records from the source
    async fn collect(&self) -> Result<Vec<Value>>;

    /// Get the name of the source platform
    fn source_name(&self) -> &'static str;
}
