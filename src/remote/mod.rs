//! Driving third-party asynchronous scrape jobs.
//!
//! The vendor protocol is "create task, start run, poll run, page through
//! results". [`JobApi`] is the transport seam, [`Orchestrator`] the state
//! machine on top of it.

pub mod client;
pub mod orchestrator;
pub mod types;

pub use client::LobstrClient;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use types::{JobState, RemoteJob, ResultsPage, RunInfo};

use crate::error::RemoteResult;
use async_trait::async_trait;

#[async_trait]
pub trait JobApi: Send + Sync {
    /// Register a scrape input on a squid. Returns the task id.
    async fn create_task(&self, squid_id: &str, search_url: Option<&str>) -> RemoteResult<String>;

    /// Start one execution of a squid.
    async fn create_run(&self, squid_id: &str) -> RemoteResult<RunInfo>;

    async fn get_run(&self, run_id: &str) -> RemoteResult<RunInfo>;

    async fn get_results(
        &self,
        squid_id: &str,
        run_id: &str,
        page: u32,
        page_size: u32,
    ) -> RemoteResult<ResultsPage>;
}
