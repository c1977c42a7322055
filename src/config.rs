use crate::dedup::FingerprintConfig;
use crate::remote::client::DEFAULT_BASE_URL;
use crate::remote::OrchestratorConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Discovery cache
    pub cache_dir: PathBuf,

    // Remote scrape service
    pub lobstr_api_token: Option<String>,
    pub lobstr_base_url: String,
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub page_size: u32,
    pub page_delay: Duration,
    pub page_retries: u32,

    // Dedup
    pub fingerprint_combo_min_fields: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            cache_dir: std::env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("cache")),
            lobstr_api_token: std::env::var("LOBSTR_API_TOKEN").ok().filter(|t| !t.is_empty()),
            lobstr_base_url: std::env::var("LOBSTR_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            poll_interval: Duration::from_secs(parse_var("POLL_INTERVAL_SECS", 5)?),
            max_wait: Duration::from_secs(parse_var("MAX_WAIT_SECS", 30 * 60)?),
            page_size: parse_var("PAGE_SIZE", 100)?,
            page_delay: Duration::from_millis(parse_var("PAGE_DELAY_MS", 1000)?),
            page_retries: parse_var("PAGE_RETRIES", 2)?,
            fingerprint_combo_min_fields: parse_var("FINGERPRINT_COMBO_MIN_FIELDS", 1)?,
        })
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            poll_interval: self.poll_interval,
            max_wait: self.max_wait,
            page_size: self.page_size,
            page_delay: self.page_delay,
            page_retries: self.page_retries,
        }
    }

    pub fn fingerprint(&self) -> FingerprintConfig {
        FingerprintConfig {
            combo_min_fields: self.fingerprint_combo_min_fields,
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        _ => Ok(default),
    }
}
