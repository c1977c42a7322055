use crate::error::CacheError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

/// One previously observed ad
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Everything remembered about one platform across runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryState {
    #[serde(rename = "lastRun", default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ads: BTreeMap<String, CacheEntry>,
}

/// Persistence seam for the discovery cache
#[async_trait]
pub trait CacheRepository: Send + Sync {
    async fn load(&self, platform: &str) -> Result<DiscoveryState, CacheError>;

    async fn save(&self, platform: &str, state: &DiscoveryState) -> Result<(), CacheError>;
}

/// One pretty-printed JSON file per platform under a cache directory
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, platform: &str) -> PathBuf {
        self.dir.join(format!("{}_discovery.json", platform))
    }
}

#[async_trait]
impl CacheRepository for JsonFileRepository {
    async fn load(&self, platform: &str) -> Result<DiscoveryState, CacheError> {
        let path = self.path_for(platform);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No discovery cache yet");
                return Ok(DiscoveryState::default());
            }
            Err(source) => {
                return Err(CacheError::Io {
                    platform: platform.to_string(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| CacheError::Corrupt {
            platform: platform.to_string(),
            source,
        })
    }

    async fn save(&self, platform: &str, state: &DiscoveryState) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            platform: platform.to_string(),
            source,
        };

        let json = serde_json::to_string_pretty(state).map_err(|source| CacheError::Corrupt {
            platform: platform.to_string(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;

        // Write beside the target then rename so readers never see a torn file
        let path = self.path_for(platform);
        let tmp = self.dir.join(format!(".{}_discovery.json.tmp", platform));
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_err)?;

        debug!(path = %path.display(), ads = state.ads.len(), "Saved discovery cache");
        Ok(())
    }
}

/// Process-local store, handy for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryRepository {
    states: RwLock<HashMap<String, DiscoveryState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheRepository for MemoryRepository {
    async fn load(&self, platform: &str) -> Result<DiscoveryState, CacheError> {
        Ok(self
            .states
            .read()
            .await
            .get(platform)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, platform: &str, state: &DiscoveryState) -> Result<(), CacheError> {
        self.states
            .write()
            .await
            .insert(platform.to_string(), state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        let state = repo.load("olx").await.unwrap();
        assert_eq!(state, DiscoveryState::default());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        std::fs::write(repo.path_for("olx"), "{not json").unwrap();
        assert!(matches!(repo.load("olx").await, Err(CacheError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn save_writes_documented_layout() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("nested"));
        let at = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let mut state = DiscoveryState {
            last_run: Some(at),
            ..Default::default()
        };
        state.ads.insert(
            "x1".into(),
            CacheEntry {
                url: "https://x/1".into(),
                first_seen: at,
                last_seen: at,
            },
        );

        repo.save("idealista", &state).await.unwrap();

        let raw = std::fs::read_to_string(repo.path_for("idealista")).unwrap();
        assert!(raw.contains('\n'), "expected pretty-printed JSON");
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["lastRun"], "2024-06-10T12:00:00Z");
        assert_eq!(json["ads"]["x1"]["url"], "https://x/1");
        assert_eq!(json["ads"]["x1"]["first_seen"], "2024-06-10T12:00:00Z");

        assert_eq!(repo.load("idealista").await.unwrap(), state);
    }

    #[tokio::test]
    async fn platforms_use_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        assert_ne!(repo.path_for("olx"), repo.path_for("idealista"));
    }
}
