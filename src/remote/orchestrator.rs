use super::types::{JobState, RemoteJob, ResultsPage};
use super::JobApi;
use crate::clock::{Clock, SystemClock};
use crate::error::{RemoteError, RemoteResult};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Timing and paging knobs for one orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Delay between run status requests
    pub poll_interval: Duration,
    /// Give up waiting for a terminal state after this long
    pub max_wait: Duration,
    pub page_size: u32,
    /// Pause between page fetches, to stay inside vendor rate limits
    pub page_delay: Duration,
    /// Extra attempts for a page that fails transiently
    pub page_retries: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(30 * 60),
            page_size: 100,
            page_delay: Duration::from_secs(1),
            page_retries: 2,
        }
    }
}

pub struct Orchestrator<A: JobApi> {
    api: A,
    clock: Arc<dyn Clock>,
    config: OrchestratorConfig,
    cancel: CancellationToken,
}

impl<A: JobApi> Orchestrator<A> {
    pub fn new(api: A, config: OrchestratorConfig) -> Self {
        Self::with_clock(api, config, Arc::new(SystemClock))
    }

    pub fn with_clock(api: A, config: OrchestratorConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            clock,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Sleep unless cancelled first. Returns false on cancellation.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = self.clock.sleep(duration) => true,
        }
    }

    fn cancelled(job: &RemoteJob) -> RemoteError {
        RemoteError::Cancelled {
            run_id: job.run_id.clone(),
            last_status: job.last_status.clone(),
        }
    }

    /// Create the task (when a search URL is given) and start a run.
    pub async fn start(&self, squid_id: &str, search_url: Option<&str>) -> RemoteResult<RemoteJob> {
        let task_id = match search_url {
            Some(url) => {
                let id = self.api.create_task(squid_id, Some(url)).await?;
                debug!(squid_id, task_id = %id, "Task created");
                Some(id)
            }
            None => None,
        };

        let run = self.api.create_run(squid_id).await?;
        info!(squid_id, run_id = %run.id, status = %run.status, "Run started");

        Ok(RemoteJob {
            squid_id: squid_id.to_string(),
            task_id,
            run_id: run.id,
            state: if run.status.is_empty() {
                JobState::Pending
            } else {
                JobState::from_remote(&run.status)
            },
            last_status: run.status,
        })
    }

    /// Poll until the run reaches a terminal state.
    ///
    /// Request errors are retried on the next tick without touching the job
    /// state, until the wall-clock ceiling. Only a failed run, rejected
    /// credentials, the ceiling or cancellation end the wait early, each with
    /// its own error.
    pub async fn wait_for_completion(&self, job: &mut RemoteJob) -> RemoteResult<()> {
        let started = self.clock.now();
        let mut polls = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Self::cancelled(job));
            }

            let waited = (self.clock.now() - started).to_std().unwrap_or_default();
            if waited >= self.config.max_wait {
                warn!(run_id = %job.run_id, polls, last_status = %job.last_status, "Gave up waiting for run");
                return Err(RemoteError::Timeout {
                    run_id: job.run_id.clone(),
                    waited_secs: waited.as_secs(),
                    last_status: job.last_status.clone(),
                });
            }

            polls += 1;
            match self.api.get_run(&job.run_id).await {
                Ok(run) => {
                    job.state = JobState::from_remote(&run.status);
                    job.last_status = run.status;
                    match job.state {
                        JobState::Completed => {
                            info!(run_id = %job.run_id, polls, "Run completed");
                            return Ok(());
                        }
                        JobState::Failed => {
                            return Err(RemoteError::RunFailed {
                                run_id: job.run_id.clone(),
                                status: job.last_status.clone(),
                            });
                        }
                        JobState::Pending | JobState::Running => {
                            debug!(run_id = %job.run_id, status = %job.last_status, "Run still in progress");
                        }
                    }
                }
                Err(e @ RemoteError::RunFailed { .. }) => return Err(e),
                Err(e) if e.is_auth() => {
                    warn!(run_id = %job.run_id, polls, error = %e, "Credentials rejected while polling");
                    return Err(RemoteError::Poll {
                        run_id: job.run_id.clone(),
                        last_status: job.last_status.clone(),
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    warn!(run_id = %job.run_id, transient = e.is_transient(), error = %e, "Error while polling, retrying");
                }
            }

            if !self.pause(self.config.poll_interval).await {
                return Err(Self::cancelled(job));
            }
        }
    }

    async fn fetch_page(&self, job: &RemoteJob, page: u32) -> RemoteResult<ResultsPage> {
        let mut attempt = 0u32;
        loop {
            let result = self
                .api
                .get_results(&job.squid_id, &job.run_id, page, self.config.page_size)
                .await;
            match result {
                Ok(results) => return Ok(results),
                Err(e) if e.is_transient() && attempt < self.config.page_retries => {
                    attempt += 1;
                    warn!(run_id = %job.run_id, page, attempt, error = %e, "Page fetch failed, retrying");
                    if !self.pause(self.config.page_delay).await {
                        return Err(Self::cancelled(job));
                    }
                }
                Err(e) => {
                    return Err(RemoteError::PageFetch {
                        run_id: job.run_id.clone(),
                        page,
                        source: Box::new(e),
                    })
                }
            }
        }
    }

    /// Page through the results of a completed run, in server order.
    ///
    /// Stops at `max_results`, at an empty page, or at a short page with no
    /// `next` pointer.
    pub async fn fetch_results(
        &self,
        job: &RemoteJob,
        max_results: Option<usize>,
    ) -> RemoteResult<Vec<Value>> {
        let mut collected = Vec::new();
        if max_results == Some(0) {
            return Ok(collected);
        }

        let mut page = 1u32;
        loop {
            if self.cancel.is_cancelled() {
                return Err(Self::cancelled(job));
            }

            let batch = self.fetch_page(job, page).await?;
            let received = batch.results.len();
            let has_next = batch.has_next();
            collected.extend(batch.results);
            debug!(run_id = %job.run_id, page, received, total = collected.len(), "Fetched results page");

            if let Some(max) = max_results {
                if collected.len() >= max {
                    collected.truncate(max);
                    break;
                }
            }

            if received == 0 || (!has_next && received < self.config.page_size as usize) {
                break;
            }

            page += 1;
            if !self.pause(self.config.page_delay).await {
                return Err(Self::cancelled(job));
            }
        }

        info!(run_id = %job.run_id, count = collected.len(), pages = page, "Fetched run results");
        Ok(collected)
    }

    /// Create, wait and fetch end-to-end.
    pub async fn run(
        &self,
        squid_id: &str,
        search_url: Option<&str>,
        max_results: Option<usize>,
    ) -> RemoteResult<Vec<Value>> {
        info!(squid_id, ?max_results, "Starting remote scrape");

        let mut job = self.start(squid_id, search_url).await?;
        self.wait_for_completion(&mut job).await?;
        self.fetch_results(&job, max_results).await
    }
}
