use thiserror::Error;

/// Failures talking to the remote scrape service
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Run {run_id} failed with status: {status}")]
    RunFailed { run_id: String, status: String },

    #[error("Run {run_id} did not finish within {waited_secs}s (last status: {last_status})")]
    Timeout {
        run_id: String,
        waited_secs: u64,
        last_status: String,
    },

    #[error("Run {run_id} was cancelled (last status: {last_status})")]
    Cancelled { run_id: String, last_status: String },

    #[error("Polling run {run_id} failed (last status: {last_status}): {source}")]
    Poll {
        run_id: String,
        last_status: String,
        #[source]
        source: Box<RemoteError>,
    },

    #[error("Fetching page {page} of run {run_id} failed: {source}")]
    PageFetch {
        run_id: String,
        page: u32,
        #[source]
        source: Box<RemoteError>,
    },
}

impl RemoteError {
    /// Worth retrying without changing job state
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Network(_) => true,
            RemoteError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Credentials rejected; no amount of retrying will help
    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::Api { status: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Parse(err.to_string())
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Discovery cache storage failures. Callers treat all of these as non-fatal.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error for {platform}: {source}")]
    Io {
        platform: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache for {platform}: {source}")]
    Corrupt {
        platform: String,
        #[source]
        source: serde_json::Error,
    },
}
